use super::*;
use crate::model::{CommandSpec, FsEffect, ResetMode};
use std::path::PathBuf;

fn parse(kdl: &str) -> Result<Pipeline> {
    parse_pipeline_str_with_env(kdl, "test".to_string(), HashMap::new())
}

#[test]
fn test_parse_simple_pipeline() {
    let kdl = r#"
        project "arbor-market"

        stage "install-deps" label="Install dependencies" {
            run "pip" "install" "-r" "requirements.txt"
        }
        stage "migrate" {
            shell "python manage.py migrate"
        }
    "#;

    let pipeline = parse(kdl).unwrap();
    assert_eq!(pipeline.name(), "arbor-market");
    assert_eq!(pipeline.stage_ids(), vec!["install-deps", "migrate"]);

    let install = &pipeline.stages()[0];
    assert_eq!(install.label, "Install dependencies");
    assert_eq!(
        install.command,
        CommandSpec::exec("pip", ["install", "-r", "requirements.txt"])
    );
    assert!(install.fail_fast);

    // label 未指定の場合はIDを使う
    let migrate = &pipeline.stages()[1];
    assert_eq!(migrate.label, "migrate");
    assert_eq!(
        migrate.command,
        CommandSpec::shell("python manage.py migrate")
    );
}

#[test]
fn test_project_name_defaults() {
    let kdl = r#"
        stage "noop" { shell "true" }
    "#;
    let pipeline = parse(kdl).unwrap();
    assert_eq!(pipeline.name(), "test");
}

#[test]
fn test_parse_label_child_node() {
    let kdl = r#"
        stage "build-css" {
            label "Build Tailwind CSS"
            run "python" "manage.py" "tailwind" "build"
        }
    "#;
    let pipeline = parse(kdl).unwrap();
    assert_eq!(pipeline.stages()[0].label, "Build Tailwind CSS");
}

#[test]
fn test_parse_integer_arguments() {
    let kdl = r#"
        stage "collect-static" {
            run "python" "manage.py" "collectstatic" "--verbosity" 2
        }
    "#;
    let pipeline = parse(kdl).unwrap();
    assert_eq!(
        pipeline.stages()[0].command,
        CommandSpec::exec("python", ["manage.py", "collectstatic", "--verbosity", "2"])
    );
}

#[test]
fn test_parse_effects() {
    let kdl = r#"
        stage "collect-static" {
            reset "staticfiles"
            reset "theme/static/css/dist" mode="clear"
            reset "media/cache" "*.tmp" "*.part"
            mkdir "logs" when="after"
            run "python" "manage.py" "collectstatic" "--noinput"
        }
    "#;

    let pipeline = parse(kdl).unwrap();
    let stage = &pipeline.stages()[0];

    assert_eq!(
        stage.before,
        vec![
            FsEffect::Reset {
                path: PathBuf::from("staticfiles"),
                mode: ResetMode::Remove,
            },
            FsEffect::Reset {
                path: PathBuf::from("theme/static/css/dist"),
                mode: ResetMode::Clear,
            },
            FsEffect::Reset {
                path: PathBuf::from("media/cache"),
                mode: ResetMode::Selective(vec!["*.tmp".to_string(), "*.part".to_string()]),
            },
        ]
    );
    assert_eq!(
        stage.after,
        vec![FsEffect::CreateDir {
            path: PathBuf::from("logs"),
        }]
    );
}

#[test]
fn test_parse_invalid_reset_mode() {
    let kdl = r#"
        stage "collect-static" {
            reset "staticfiles" mode="wipe"
            shell "true"
        }
    "#;
    assert!(matches!(parse(kdl), Err(PipelineError::InvalidStage(_))));
}

#[test]
fn test_parse_invalid_when() {
    let kdl = r#"
        stage "collect-static" {
            mkdir "logs" when="during"
            shell "true"
        }
    "#;
    assert!(matches!(parse(kdl), Err(PipelineError::InvalidStage(_))));
}

#[test]
fn test_parse_requires_and_optional() {
    let kdl = r#"
        stage "migrate" {
            run "python" "manage.py" "migrate"
        }
        stage "create-admin" optional=#true {
            requires "migrate"
            env {
                ADMIN_USERNAME "admin"
                ADMIN_EMAIL "admin@example.com"
            }
            run "python" "create_superuser.py"
        }
    "#;

    let pipeline = parse(kdl).unwrap();
    let admin = pipeline.get("create-admin").unwrap();
    assert!(admin.optional);
    assert_eq!(admin.requires, vec!["migrate".to_string()]);
    assert_eq!(
        admin.env.get("ADMIN_EMAIL").map(String::as_str),
        Some("admin@example.com")
    );
}

#[test]
fn test_parse_requires_out_of_order() {
    let kdl = r#"
        stage "create-admin" {
            requires "migrate"
            run "python" "create_superuser.py"
        }
        stage "migrate" {
            run "python" "manage.py" "migrate"
        }
    "#;
    assert!(matches!(
        parse(kdl),
        Err(PipelineError::OrderViolation { .. })
    ));
}

#[test]
fn test_parse_missing_command() {
    let kdl = r#"
        stage "migrate" label="no command"
    "#;
    assert!(matches!(
        parse(kdl),
        Err(PipelineError::MissingCommand(id)) if id == "migrate"
    ));
}

#[test]
fn test_parse_conflicting_command() {
    let kdl = r#"
        stage "migrate" {
            run "python" "manage.py" "migrate"
            shell "python manage.py migrate"
        }
    "#;
    assert!(matches!(
        parse(kdl),
        Err(PipelineError::ConflictingCommand(id)) if id == "migrate"
    ));
}

#[test]
fn test_parse_stage_without_id() {
    let kdl = r#"
        stage { shell "true" }
    "#;
    assert!(matches!(parse(kdl), Err(PipelineError::InvalidStage(_))));
}

#[test]
fn test_parse_fail_fast_false_rejected() {
    let kdl = r#"
        stage "lint" fail-fast=#false {
            shell "flake8"
        }
    "#;
    assert!(matches!(parse(kdl), Err(PipelineError::InvalidStage(_))));
}

#[test]
fn test_parse_duplicate_stage() {
    let kdl = r#"
        stage "migrate" { shell "true" }
        stage "migrate" { shell "true" }
    "#;
    assert!(matches!(parse(kdl), Err(PipelineError::DuplicateStage(_))));
}

#[test]
fn test_variables_expanded() {
    let kdl = r#"
        variables {
            PYTHON "python3"
            STATIC_ROOT "public/static"
        }

        stage "collect-static" label="collect into {{ STATIC_ROOT }}" {
            reset "{{ STATIC_ROOT }}" mode="clear"
            run "{{ PYTHON }}" "manage.py" "collectstatic"
        }
    "#;

    let pipeline = parse(kdl).unwrap();
    let stage = &pipeline.stages()[0];
    assert_eq!(stage.label, "collect into public/static");
    assert_eq!(
        stage.command,
        CommandSpec::exec("python3", ["manage.py", "collectstatic"])
    );
    assert_eq!(
        stage.before,
        vec![FsEffect::Reset {
            path: PathBuf::from("public/static"),
            mode: ResetMode::Clear,
        }]
    );
}

#[test]
fn test_variables_block_after_stage_still_applies() {
    let kdl = r#"
        stage "deps" { run "{{ PIP }}" "install" }
        variables { PIP "pip3" }
    "#;
    let pipeline = parse(kdl).unwrap();
    assert_eq!(
        pipeline.stages()[0].command,
        CommandSpec::exec("pip3", ["install"])
    );
}

#[test]
fn test_env_placeholders_use_given_table() {
    let kdl = r#"
        stage "create-admin" {
            env { ADMIN_USERNAME "{{ env.ADMIN_USERNAME }}" }
            shell "python create_superuser.py"
        }
    "#;

    let mut env = HashMap::new();
    env.insert("ADMIN_USERNAME".to_string(), "farmer-admin".to_string());
    let pipeline = parse_pipeline_str_with_env(kdl, "test".to_string(), env).unwrap();

    assert_eq!(
        pipeline.stages()[0]
            .env
            .get("ADMIN_USERNAME")
            .map(String::as_str),
        Some("farmer-admin")
    );
}

#[test]
fn test_unknown_nodes_are_ignored() {
    let kdl = r#"
        include "other.kdl"
        stage "noop" {
            retries 3
            shell "true"
        }
    "#;
    let pipeline = parse(kdl).unwrap();
    assert_eq!(pipeline.len(), 1);
}

#[test]
fn test_empty_document() {
    let pipeline = parse("").unwrap();
    assert!(pipeline.is_empty());
}

#[test]
fn test_parse_syntax_error() {
    assert!(matches!(
        parse(r#"stage "broken" {"#),
        Err(PipelineError::KdlParse(_))
    ));
}

#[test]
fn test_parse_pipeline_file() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("arbor-market");
    std::fs::create_dir(&project).unwrap();
    let file = project.join("provision.kdl");
    std::fs::write(&file, r#"stage "noop" { shell "true" }"#).unwrap();

    let pipeline = parse_pipeline_file(&file).unwrap();
    assert_eq!(pipeline.name(), "arbor-market");
    assert_eq!(pipeline.stage_ids(), vec!["noop"]);
}

#[test]
fn test_parse_pipeline_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = parse_pipeline_file(dir.path().join("provision.kdl"));
    assert!(matches!(result, Err(PipelineError::IoError { .. })));
}
