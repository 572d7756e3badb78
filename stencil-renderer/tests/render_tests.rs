//! End-to-end rendering: bind values, render, inspect the resulting object.

use pretty_assertions::assert_eq;
use serde_json::json;
use stencil_core::types::{
    ObjectMetadata, ObjectSpec, OwnerReference, Parameter, ParameterRecord, Template,
    TemplateName, ValueMap,
};
use stencil_renderer::{RenderError, RenderedObject, Renderer, VariableMap};

fn object(name: &str, body: &str) -> ObjectSpec {
    ObjectSpec {
        name: name.into(),
        kind: "ConfigMap".into(),
        api_version: "v1".into(),
        metadata: ObjectMetadata::default(),
        content_key: None,
        body: body.into(),
    }
}

fn template(params: &[(&str, &str)], objects: Vec<ObjectSpec>) -> Template {
    Template {
        name: TemplateName::from("t1"),
        description: String::new(),
        parameters: params
            .iter()
            .map(|(name, default)| Parameter { name: (*name).into(), default: (*default).into() })
            .collect(),
        objects,
    }
}

fn values(pairs: &[(&str, &str)]) -> ValueMap {
    pairs.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect()
}

fn render_first(t: &Template, ns: &str, supplied: &ValueMap) -> Result<RenderedObject, RenderError> {
    let spec = &t.objects[0];
    let vars = VariableMap::bind(t, spec, ns, supplied);
    Renderer::new().expect("renderer").render(spec, &vars, ns, &[])
}

// ---------------------------------------------------------------------------
// 1. Value binding through rendering
// ---------------------------------------------------------------------------

#[test]
fn supplied_value_is_rendered() {
    let t = template(&[("lives", "5")], vec![object("game", "value: \"{{ .lives }}\"\n")]);
    let rendered = render_first(&t, "default", &values(&[("lives", "3")])).expect("render");
    assert_eq!(rendered.content.get("value"), Some(&json!("3")));
}

#[test]
fn empty_value_renders_default() {
    let t = template(&[("lives", "5")], vec![object("game", "value: \"{{ .lives }}\"\n")]);
    let rendered = render_first(&t, "default", &values(&[("lives", "")])).expect("render");
    assert_eq!(rendered.content.get("value"), Some(&json!("5")));
}

#[test]
fn reserved_variables_are_available_to_the_body() {
    let body = "data:\n  where: \"{{ .__namespace }}\"\n  what: \"{{ .__kind }}/{{ .__name }}\"\n";
    let t = template(&[], vec![object("game", body)]);
    let rendered = render_first(&t, "team-a", &values(&[("__namespace", "evil")])).expect("render");
    assert_eq!(
        rendered.content.get("data"),
        Some(&json!({"where": "team-a", "what": "ConfigMap/game"}))
    );
}

#[test]
fn default_referencing_namespace_is_expanded() {
    let mut pod = object(
        "new-pod-name",
        "spec:\n  containers:\n  - name: \"{{ .containerName }}\"\n    image: \"{{ .imageName }}\"\n",
    );
    pod.kind = "Pod".into();
    let t = template(&[("imageName", "latest"), ("containerName", "{{ .__namespace }}")], vec![pod]);

    let rendered = render_first(&t, "team-a", &values(&[])).expect("render");
    assert_eq!(
        rendered.content.get("spec"),
        Some(&json!({"containers": [{"name": "team-a", "image": "latest"}]}))
    );
}

#[test]
fn supplied_value_with_braces_is_not_expanded() {
    let t = template(&[("motd", "hi")], vec![object("game", "value: \"{{ .motd }}\"\n")]);
    let rendered =
        render_first(&t, "default", &values(&[("motd", "{{ .__namespace }}")])).expect("render");
    assert_eq!(rendered.content.get("value"), Some(&json!("{{ .__namespace }}")));
}

// ---------------------------------------------------------------------------
// 2. Document shape and identity
// ---------------------------------------------------------------------------

#[test]
fn content_key_wraps_multiline_body() {
    let mut spec = object("game-config", "game.properties: |\n  lives={{ .lives }}\n  enemies=aliens\nui.properties: \"color=blue\"");
    spec.content_key = Some("data".into());
    let t = template(&[("lives", "5")], vec![spec]);

    let rendered = render_first(&t, "default", &values(&[])).expect("render");
    assert_eq!(
        rendered.content.get("data"),
        Some(&json!({
            "game.properties": "lives=5\nenemies=aliens\n",
            "ui.properties": "color=blue"
        }))
    );
}

#[test]
fn identity_comes_from_spec_and_target_namespace() {
    let mut spec = object("game", "data:\n  a: b\n");
    spec.metadata.labels.insert("app".into(), "game".into());
    spec.metadata.annotations.insert("owner".into(), "team".into());
    let t = template(&[], vec![spec.clone()]);
    let record = ParameterRecord {
        name: "otp".into(),
        namespace: "team-b".into(),
        uid: Some("uid-1".into()),
        bindings: vec![],
    };
    let owner = OwnerReference::controller_for(&record, "stencil.dev/v1", "ObjectTemplateParams");

    let vars = VariableMap::bind(&t, &spec, "team-b", &values(&[]));
    let rendered = Renderer::new().unwrap().render(&spec, &vars, "team-b", &[owner.clone()]).unwrap();

    assert_eq!(rendered.reference(), "ConfigMap(game)@team-b");
    assert_eq!(rendered.key.api_version, "v1");
    assert_eq!(rendered.labels.get("app").map(String::as_str), Some("game"));
    assert_eq!(rendered.annotations.get("owner").map(String::as_str), Some("team"));
    assert_eq!(rendered.owner_references, vec![owner]);

    let manifest = rendered.to_value();
    assert_eq!(manifest["metadata"]["ownerReferences"][0]["uid"], "uid-1");
    assert_eq!(manifest["metadata"]["ownerReferences"][0]["controller"], true);
}

// ---------------------------------------------------------------------------
// 3. Errors
// ---------------------------------------------------------------------------

#[test]
fn undefined_variable_is_template_error() {
    let t = template(&[], vec![object("broken", "value: \"{{ .undefined_no_default }}\"\n")]);
    let err = render_first(&t, "default", &values(&[])).unwrap_err();
    assert!(matches!(err, RenderError::Template(_)), "got: {err}");
    assert!(err.to_string().contains("undefined_no_default"), "got: {err}");
}

#[test]
fn unclosed_placeholder_is_template_error() {
    let t = template(&[], vec![object("broken", "value: \"{{ .lives \"\n")]);
    let err = render_first(&t, "default", &values(&[])).unwrap_err();
    assert!(matches!(err, RenderError::Template(_)), "got: {err}");
}

#[test]
fn substituted_value_breaking_yaml_is_decode_error() {
    let t = template(&[("raw", "")], vec![object("game", "data: {{ .raw }}\n")]);
    let err = render_first(&t, "default", &values(&[("raw", "[unclosed")])).unwrap_err();
    assert!(matches!(err, RenderError::Decode(_)), "got: {err}");
}

#[test]
fn shell_and_jinja_like_text_passes_through() {
    let body = "data:\n  script: \"echo ${#ARR[@]} {{ .__namespace }}\"\n  note: \"{% raw %} and {# not a comment #}\"\n";
    let t = template(&[], vec![object("game", body)]);
    let rendered = render_first(&t, "team-a", &values(&[])).expect("render");
    assert_eq!(
        rendered.content.get("data"),
        Some(&json!({
            "script": "echo ${#ARR[@]} team-a",
            "note": "{% raw %} and {# not a comment #}"
        }))
    );
}
