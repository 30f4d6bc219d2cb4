//! Schema synthesis tests over realistic values files

#![expect(clippy::unwrap_used, reason = "This is a test module")]

use chart_schema::config::{SkipAutoGeneration, SynthesisOptions};
use chart_schema::error::SchemaError;
use chart_schema::schema::{Schema, Synthesizer, validate};
use chart_schema::system::MockSystem;
use chart_schema::values::ValuesDocument;
use serde_json::{Value, json};
use std::path::Path;

const VALUES: &str = r#"# @schema.root
# title: Web application
# @schema.root
# Number of pods
replicaCount: 1

image:
  # @schema
  # enum: [Always, IfNotPresent, Never]
  # @schema
  # Image pull policy
  pullPolicy: IfNotPresent
  # -- Image tag, defaults to the chart version
  tag: ""

# @schema
# type: object
# additionalProperties:
#   type: string
# @schema
podLabels: {}

ingress:
  enabled: false
  hosts:
    - host: chart.local
      paths:
        - /
"#;

fn synthesize(source: &str, options: &SynthesisOptions) -> Result<Schema, SchemaError> {
    let system = MockSystem::new();
    let document = ValuesDocument::parse(source)?;
    Synthesizer::new(options, &system, Path::new("/chart/values.yaml")).synthesize(&document)
}

fn synthesize_value(source: &str) -> Value {
    synthesize(source, &SynthesisOptions::default())
        .unwrap()
        .to_value()
        .unwrap()
}

#[test]
fn test_realistic_values_file() {
    let schema = synthesize_value(VALUES);

    assert_eq!(schema["title"], json!("Web application"));
    assert_eq!(schema["properties"]["replicaCount"]["description"], json!("Number of pods"));
    assert_eq!(
        schema["properties"]["image"]["properties"]["pullPolicy"],
        json!({
            "title": "pullPolicy",
            "description": "Image pull policy",
            "enum": ["Always", "IfNotPresent", "Never"],
            "default": "IfNotPresent",
        })
    );
    assert_eq!(
        schema["properties"]["image"]["properties"]["tag"]["description"],
        json!("Image tag, defaults to the chart version")
    );
    assert_eq!(schema["properties"]["image"]["required"], json!(["tag"]));
    assert_eq!(
        schema["properties"]["podLabels"],
        json!({
            "type": "object",
            "additionalProperties": {"type": "string"},
            "title": "podLabels",
        })
    );

    let hosts = &schema["properties"]["ingress"]["properties"]["hosts"];
    assert_eq!(hosts["type"], json!("array"));
    let host_item = &hosts["items"]["anyOf"][0];
    assert_eq!(host_item["required"], json!(["host", "paths"]));
    assert_eq!(
        host_item["properties"]["paths"]["items"],
        json!({"anyOf": [{"type": "string"}]})
    );
    assert_eq!(
        schema["required"],
        json!(["replicaCount", "image", "ingress"])
    );
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let first = synthesize(VALUES, &SynthesisOptions::default())
        .unwrap()
        .to_json()
        .unwrap();
    let second = synthesize(VALUES, &SynthesisOptions::default())
        .unwrap()
        .to_json()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_synthesized_schema_is_a_valid_schema() {
    let schema = synthesize(VALUES, &SynthesisOptions::default()).unwrap();
    validate(&schema).unwrap();
}

#[test]
fn test_skip_type_and_description() {
    let options = SynthesisOptions {
        skip: "type,description".parse::<SkipAutoGeneration>().unwrap(),
        ..SynthesisOptions::default()
    };
    let schema = synthesize("# Size\nsize: 3\n", &options).unwrap().to_value().unwrap();
    assert_eq!(
        schema["properties"]["size"],
        json!({"title": "size", "default": "3"})
    );
}

#[test]
fn test_constraint_violations_abort_synthesis() {
    let cases = [
        "# @schema\n# type: string\n# const: x\n# @schema\na: x\n",
        "# @schema\n# type: number\n# multipleOf: 0\n# @schema\na: 1\n",
        "# @schema\n# type: string\n# minLength: 2\n# maxLength: 1\n# @schema\na: x\n",
        "# @schema\n# type: array\n# items:\n#   type: string\n#   minimum: 1\n# @schema\na: []\n",
    ];
    for source in cases {
        let err = synthesize(source, &SynthesisOptions::default()).unwrap_err();
        assert!(
            matches!(err, SchemaError::Validation { ref key, .. } if key == "a"),
            "{source}: {err}"
        );
    }

    let allowed = "# @schema\n# type: number\n# multipleOf: 0.1\n# @schema\na: 1\n";
    synthesize(allowed, &SynthesisOptions::default()).unwrap();
}

#[test]
fn test_missing_reference_target() {
    let source = "# @schema\n# $ref: missing.json\n# @schema\na: 1\n";
    let err = synthesize(source, &SynthesisOptions::default()).unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvedReference { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_remote_reference_is_kept() {
    let source = "# @schema\n# $ref: https://example.com/schema.json\n# @schema\na: 1\n";
    let schema = synthesize_value(source);
    assert_eq!(
        schema["properties"]["a"],
        json!({"$ref": "https://example.com/schema.json"})
    );
    assert!(schema.get("required").is_none());
}

#[test]
fn test_malformed_annotation() {
    let err = synthesize("# @schema\n# type: [\n# @schema\na: 1\n", &SynthesisOptions::default())
        .unwrap_err();
    assert!(matches!(err, SchemaError::MalformedAnnotation { ref key, .. } if key == "a"));
}
