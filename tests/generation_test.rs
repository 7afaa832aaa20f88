//! End-to-end generation over template trees built in temporary directories

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use kapeta_codegen::{
    CodeFormatter, DslError, DslParseOptions, DslParseResult, DslParser, Error, FileMode,
    GeneratedFile, LanguageTarget, Target, TargetOptions,
};
use serde_json::{Value as JsonValue, json};
use tempfile::{TempDir, tempdir};

fn write_templates(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join("templates").join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn target_with(files: &[(&str, &str)]) -> (TempDir, Target) {
    let dir = tempdir().unwrap();
    write_templates(dir.path(), files);
    let target = Target::new(TargetOptions::new(), dir.path());
    (dir, target)
}

fn service_context() -> JsonValue {
    json!({
        "metadata": {"name": "users"},
        "spec": {
            "consumers": [
                {"kind": "kapeta/resource-type-mysql:0.1.0", "metadata": {"name": "userdb"}}
            ],
            "providers": [
                {"kind": "kapeta/block-type-gateway-http:1.0.0", "metadata": {"name": "api"}}
            ],
            "entities": {"types": [
                {"name": "User", "type": "dto"},
                {"name": "Address", "type": "dto"},
                {"name": "Role", "type": "enum"}
            ]}
        }
    })
}

#[test]
fn test_segments_keep_order_and_drop_skipped() -> Result<()> {
    let (_dir, target) = target_with(&[(
        "kapeta/test/files",
        "#FILENAME:a\nX\n#FILENAME:b:skip\nY\n#FILENAME:c:merge:600\nZ",
    )]);

    let files = target.generate(&json!({"kind": "kapeta/test"}), &json!({}))?;

    assert_eq!(
        files,
        vec![
            GeneratedFile {
                filename: "a".to_string(),
                content: "X".to_string(),
                mode: FileMode::WriteAlways,
                permissions: "644".to_string(),
            },
            GeneratedFile {
                filename: "c".to_string(),
                content: "Z".to_string(),
                mode: FileMode::Merge,
                permissions: "600".to_string(),
            },
        ]
    );
    Ok(())
}

#[test]
fn test_template_files_render_in_directory_order() -> Result<()> {
    let (_dir, target) = target_with(&[
        ("kapeta/test/b.txt", "second"),
        ("kapeta/test/a.txt", "first"),
        ("kapeta/test/nested/c.txt", "third"),
        ("kapeta/test/empty.txt", "\n   \n"),
    ]);

    let files = target.generate(&json!({"kind": "kapeta/test"}), &json!({}))?;
    let names: Vec<&str> = files.iter().map(|file| file.filename.as_str()).collect();

    assert_eq!(names, vec!["a.txt", "b.txt", "nested/c.txt"]);
    Ok(())
}

#[test]
fn test_generation_is_deterministic() -> Result<()> {
    let (_dir, target) = target_with(&[
        (
            "kapeta/block-type-service/service.txt",
            "#FILENAME:{{data.metadata.name}}.txt:create-only\n{{#each context.spec.consumers}}{{metadata.name}}\n{{/each}}",
        ),
        ("kapeta/block-type-service/readme.md", "# {{data.metadata.name}}"),
    ]);
    let data = json!({"kind": "kapeta/block-type-service:1.2.3", "metadata": {"name": "users"}});
    let context = service_context();

    let first = target.generate(&data, &context)?;
    let second = target.generate(&data, &context)?;

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].filename, "readme.md");
    assert_eq!(first[1].filename, "users.txt");
    assert_eq!(first[1].mode, FileMode::CreateOnly);
    Ok(())
}

#[test]
fn test_merge_mode_with_scheme_kind() -> Result<()> {
    let (_dir, target) = target_with(&[(
        "kapeta/test/pom.xml",
        "<!-- #FILENAME:pom.xml:merge -->\n<project>{{data.metadata.name}}</project>",
    )]);

    let files = target.generate(
        &json!({"kind": "kapeta://kapeta/test:local", "metadata": {"name": "demo"}}),
        &json!({}),
    )?;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "pom.xml");
    assert_eq!(files[0].mode, FileMode::Merge);
    assert_eq!(files[0].permissions, "644");
    assert_eq!(files[0].content, "<project>demo</project>");
    Ok(())
}

#[test]
fn test_missing_template_directory() {
    let (dir, target) = target_with(&[]);

    let error = target
        .generate(&json!({"kind": "missing/thing"}), &json!({}))
        .unwrap_err();

    assert!(error.is_configuration());
    let missing = dir.path().join("templates").join("missing").join("thing");
    assert!(error.to_string().contains(&missing.display().to_string()));
}

#[test]
fn test_missing_kind() {
    let (_dir, target) = target_with(&[("kapeta/test/a.txt", "a")]);
    let error = target.generate(&json!({"name": "x"}), &json!({})).unwrap_err();
    assert!(matches!(error, Error::MissingKind(_)));
}

#[test]
fn test_partials_from_whole_template_tree() -> Result<()> {
    let (_dir, target) = target_with(&[
        ("header", "// {{data.metadata.name}} generated"),
        ("kapeta/other/shared.txt", "shared body"),
        (
            "kapeta/test/Main.java",
            "{{> header}} | class Main {} | {{> kapeta/other/shared.txt}}",
        ),
    ]);

    let files = target.generate(
        &json!({"kind": "kapeta/test", "metadata": {"name": "users"}}),
        &json!({}),
    )?;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "// users generated | class Main {} | shared body");
    Ok(())
}

#[test]
fn test_render_failure_names_template() {
    let (_dir, target) = target_with(&[("kapeta/test/broken.txt", "before {{> does-not-exist}}")]);

    let error = target
        .generate(&json!({"kind": "kapeta/test"}), &json!({}))
        .unwrap_err();

    match error {
        Error::Render { path, message } => {
            assert!(path.ends_with("kapeta/test/broken.txt"), "{}", path.display());
            assert!(!message.is_empty());
        }
        other => panic!("expected render error, got {other:?}"),
    }
}

#[test]
fn test_invalid_template_syntax_is_render_error() {
    let (_dir, target) = target_with(&[("kapeta/test/broken.txt", "{{#if data.kind}}unclosed")]);

    let error = target
        .generate(&json!({"kind": "kapeta/test"}), &json!({}))
        .unwrap_err();

    assert!(matches!(error, Error::Render { .. }));
    assert!(error.to_string().contains("broken.txt"));
}

#[test]
fn test_binary_assets_do_not_break_generation() -> Result<()> {
    let (dir, target) = target_with(&[("kapeta/test/Main.java", "class Main {}")]);
    let png = [0x89, 0x50, 0x4E, 0x47, 0xFF, 0xFE];
    let templates = dir.path().join("templates");
    fs::create_dir_all(templates.join("kapeta/other"))?;
    fs::write(templates.join("kapeta/other/logo.png"), png)?;
    fs::create_dir_all(templates.join("kapeta/test/.mvn/wrapper"))?;
    fs::write(templates.join("kapeta/test/.mvn/wrapper/maven-wrapper.jar"), png)?;

    let files = target.generate(&json!({"kind": "kapeta/test"}), &json!({}))?;

    let names: Vec<&str> = files.iter().map(|file| file.filename.as_str()).collect();
    assert_eq!(names, vec![".mvn/wrapper/maven-wrapper.jar", "Main.java"]);
    assert_eq!(files[1].content, "class Main {}");
    Ok(())
}

#[test]
fn test_broken_template_in_other_kind_is_ignored() -> Result<()> {
    let (_dir, target) = target_with(&[
        ("kapeta/other/broken.txt", "{{#if x}}unclosed"),
        ("kapeta/test/Main.java", "class Main {}"),
    ]);

    let files = target.generate(&json!({"kind": "kapeta/test"}), &json!({}))?;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "class Main {}");
    Ok(())
}

#[test]
fn test_templates_cannot_corrupt_each_others_data() -> Result<()> {
    let (_dir, target) = target_with(&[
        ("kapeta/test/a.txt", "{{data.metadata.name}}"),
        ("kapeta/test/b.txt", "{{data.metadata.name}}"),
    ]);
    let data = json!({"kind": "kapeta/test", "metadata": {"name": "stable"}});

    let files = target.generate(&data, &json!({}))?;

    assert!(files.iter().all(|file| file.content == "stable"));
    assert_eq!(data["metadata"]["name"], "stable");
    Ok(())
}

#[test]
fn test_kind_and_type_helpers_against_context() -> Result<()> {
    let template = r#"{{#consumes "kapeta/resource-type-mysql*"}}uses mysql{{else}}no mysql{{/consumes}}
{{#provides "kapeta/block-type-gateway-http"}}http gateway{{/provides}}
{{#eachTypeReference data.spec.model}}import {{name}};
{{/eachTypeReference}}{{#switch data.spec.style}}{{#case "rest"}}REST{{/case}}{{#case "grpc"}}GRPC{{/case}}{{/switch}}"#;
    let (_dir, target) = target_with(&[("kapeta/block-type-service/Service.java", template)]);

    let data = json!({
        "kind": "kapeta/block-type-service:1.0.0",
        "spec": {
            "style": "rest",
            "model": {
                "user": {"ref": "User"},
                "addresses": {"ref": "Address[]"},
                "role": {"ref": "Role"},
                "again": [{"ref": "User"}]
            }
        }
    });

    let files = target.generate(&data, &service_context())?;

    assert_eq!(
        files[0].content,
        "uses mysql\nhttp gateway\nimport User;\nimport Address;\nREST"
    );
    Ok(())
}

struct TypeScriptFormatter;

impl CodeFormatter for TypeScriptFormatter {
    fn getter(&self, _type_name: &str, property_id: &str) -> String {
        format!("get {property_id}")
    }

    fn methods(&self, values: &[String]) -> String {
        values.join("\n")
    }
}

#[test]
fn test_custom_formatter_is_used_by_helpers() -> Result<()> {
    let template = r#"{{#methods data.methods}}{{methodName}}({{#arguments arguments}}{{argumentName}}: {{type this}}{{/arguments}}){{/methods}}
{{getter "boolean" "active"}}"#;
    let (_dir, target) = target_with(&[("kapeta/test/api.ts", template)]);
    let target = target.with_formatter(Arc::new(TypeScriptFormatter));

    let data = json!({
        "kind": "kapeta/test",
        "methods": {
            "find": {"arguments": {"limit": {"type": "number", "optional": true}, "query": {"type": "string"}}},
            "remove": {"arguments": {"id": {"ref": "userId"}}}
        }
    });

    let files = target.generate(&data, &json!({}))?;

    assert_eq!(
        files[0].content,
        "find(query: String, limit: Number)\nremove(id: UserId)\nget active"
    );
    Ok(())
}

struct EntityParser;

impl DslParser for EntityParser {
    fn parse(
        &self,
        _source: &str,
        _options: &DslParseOptions,
    ) -> std::result::Result<DslParseResult, DslError> {
        Ok(DslParseResult {
            entities: Some(vec![
                json!({"type": "datatype", "name": "User", "properties": [{"name": "home", "type": {"ref": "Address"}}]}),
                json!({"type": "datatype", "name": "Date"}),
            ]),
            errors: vec![],
        })
    }

    fn is_native(&self, entity: &JsonValue) -> bool {
        entity["name"] == "Date"
    }
}

struct FailingParser;

impl DslParser for FailingParser {
    fn parse(
        &self,
        _source: &str,
        _options: &DslParseOptions,
    ) -> std::result::Result<DslParseResult, DslError> {
        Ok(DslParseResult {
            entities: None,
            errors: vec!["unexpected token '}'".to_string()],
        })
    }
}

#[test]
fn test_kaplang_types_render_non_native_entities() -> Result<()> {
    let template = "{{#kaplang-types data.spec.source}}{{#kaplang-render this}}class {{name}}{{#kaplang-has-reference this \"Address\"}} uses Address{{/kaplang-has-reference}}{{/kaplang-render}}{{/kaplang-types}}";
    let (_dir, target) = target_with(&[("kapeta/test/types.ts", template)]);
    let target = target.with_dsl_parser(Arc::new(EntityParser));

    let files = target.generate(
        &json!({"kind": "kapeta/test", "spec": {"source": {"value": "type User { home: Address }"}}}),
        &json!({}),
    )?;

    assert_eq!(files[0].content, "class User uses Address\n");
    Ok(())
}

#[test]
fn test_kaplang_parse_errors_abort_generation() {
    let template = "{{#kaplang-types data.spec.source}}{{name}}{{/kaplang-types}}";
    let (_dir, target) = target_with(&[("kapeta/test/types.ts", template)]);
    let target = target.with_dsl_parser(Arc::new(FailingParser));

    let error = target
        .generate(
            &json!({"kind": "kapeta/test", "spec": {"source": {"value": "type User {"}}}),
            &json!({}),
        )
        .unwrap_err();

    match error {
        Error::Render { path, message } => {
            assert!(path.ends_with("kapeta/test/types.ts"));
            assert!(message.contains("unexpected token"), "{message}");
        }
        other => panic!("expected render error, got {other:?}"),
    }
}

/// Target that stamps a build number onto the data before rendering
struct StampingTarget {
    inner: Target,
}

#[async_trait]
impl LanguageTarget for StampingTarget {
    fn generate(&self, data: &JsonValue, context: &JsonValue) -> kapeta_codegen::Result<Vec<GeneratedFile>> {
        self.inner.generate(data, context)
    }

    async fn preprocess(&self, mut data: JsonValue) -> kapeta_codegen::Result<JsonValue> {
        data["build"] = json!(42);
        Ok(data)
    }
}

#[tokio::test]
async fn test_generate_prepared_runs_preprocess() -> Result<()> {
    let (_dir, inner) = target_with(&[("kapeta/test/build.txt", "build {{data.build}}")]);
    let target = StampingTarget { inner };

    let files = target
        .generate_prepared(json!({"kind": "kapeta/test"}), &json!({}))
        .await?;

    assert_eq!(files[0].content, "build 42");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_generation_is_isolated() -> Result<()> {
    let (_dir, target) = target_with(&[(
        "kapeta/test/out.txt",
        "{{#switch data.value}}{{#case \"a\"}}A{{/case}}{{#case \"b\"}}B{{/case}}{{/switch}}",
    )]);
    let target = Arc::new(target);

    let handles: Vec<_> = ["a", "b", "a", "b"]
        .into_iter()
        .map(|value| {
            let target = Arc::clone(&target);
            tokio::task::spawn_blocking(move || {
                target.generate(&json!({"kind": "kapeta/test", "value": value}), &json!({}))
            })
        })
        .collect();

    let mut contents = Vec::new();
    for handle in handles {
        let files = handle.await??;
        contents.push(files[0].content.clone());
    }

    assert_eq!(contents, vec!["A", "B", "A", "B"]);
    Ok(())
}
