use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use speculate2::speculate;
use studio_designer::error::ServiceError;
use studio_designer::models::*;
use studio_designer::repo::{EditingContext, Repository};
use studio_designer::validation::LayoutSetName;

const ORG: &str = "ttd";
const APP: &str = "my-app";
const DEVELOPER: &str = "testUser";

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read_json(root: &Path, relative: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(root.join(relative)).unwrap()).unwrap()
}

fn layout(ids: &[&str]) -> Value {
    let entries: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "type": "Input" }))
        .collect();
    json!({ "$schema": LAYOUT_SCHEMA_URL, "data": { "layout": entries } })
}

fn set(name: &str) -> LayoutSetName {
    LayoutSetName::parse(name).unwrap()
}

fn add_layout_sets(clone: &Path, ids: &[&str]) {
    let sets = LayoutSets::new(
        ids.iter()
            .map(|id| LayoutSetConfig {
                id: id.to_string(),
                ..Default::default()
            })
            .collect(),
    );
    write(
        clone,
        "App/ui/layout-sets.json",
        &serde_json::to_string(&sets).unwrap(),
    );
}

speculate! {
    before {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo = Repository::open(dir.path().to_path_buf()).expect("Failed to open repository");
        let ctx = EditingContext::new(ORG, APP, DEVELOPER);
        let clone = repo.clone_path(&ctx);
        fs::create_dir_all(&clone).unwrap();
    }

    describe "working copies" {
        it "lives below developer, org and repo" {
            assert_eq!(clone, dir.path().join(DEVELOPER).join(ORG).join(APP));
        }

        it "fails with not found when the repository is not cloned" {
            let other = EditingContext::new(ORG, "other-app", DEVELOPER);
            let result = repo.get_form_layouts(&other, None);
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
    }

    describe "form layouts" {
        it "returns an empty map when there are no layouts" {
            let layouts = repo.get_form_layouts(&ctx, None).unwrap();
            assert!(layouts.is_empty());
        }

        it "saves layouts and adds them to the page order" {
            repo.save_form_layout(&ctx, None, "Side1", &layout(&["a"])).unwrap();
            repo.save_form_layout(&ctx, None, "Side2", &layout(&["b"])).unwrap();
            repo.save_form_layout(&ctx, None, "Side1", &layout(&["a", "c"])).unwrap();

            let layouts = repo.get_form_layouts(&ctx, None).unwrap();
            assert_eq!(layouts.keys().collect::<Vec<_>>(), ["Side1", "Side2"]);
            assert_eq!(layouts["Side1"], layout(&["a", "c"]));

            let settings = read_json(&clone, "App/ui/Settings.json");
            assert_eq!(settings["pages"]["order"], json!(["Side1", "Side2"]));
        }

        it "deletes a layout and removes it from the page order" {
            repo.save_form_layout(&ctx, None, "Side1", &layout(&["a"])).unwrap();
            repo.save_form_layout(&ctx, None, "Side2", &layout(&["b"])).unwrap();

            repo.delete_form_layout(&ctx, None, "Side1").unwrap();

            assert!(!clone.join("App/ui/layouts/Side1.json").exists());
            let settings = read_json(&clone, "App/ui/Settings.json");
            assert_eq!(settings["pages"]["order"], json!(["Side2"]));
        }

        it "fails to delete a missing layout" {
            let result = repo.delete_form_layout(&ctx, None, "Nope");
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }

        it "renames a layout in place in the page order" {
            repo.save_form_layout(&ctx, None, "Side1", &layout(&["a"])).unwrap();
            repo.save_form_layout(&ctx, None, "Side2", &layout(&["b"])).unwrap();

            repo.rename_form_layout(&ctx, None, "Side1", "Start").unwrap();

            assert!(clone.join("App/ui/layouts/Start.json").is_file());
            let settings = read_json(&clone, "App/ui/Settings.json");
            assert_eq!(settings["pages"]["order"], json!(["Start", "Side2"]));
        }

        it "refuses to rename onto an existing layout" {
            repo.save_form_layout(&ctx, None, "Side1", &layout(&["a"])).unwrap();
            repo.save_form_layout(&ctx, None, "Side2", &layout(&["b"])).unwrap();

            let result = repo.rename_form_layout(&ctx, None, "Side1", "Side2");
            assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        }

        it "rejects layout names that leave the layouts folder" {
            let result = repo.save_form_layout(&ctx, None, "../escape", &layout(&[]));
            assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        }
    }

    describe "layout settings" {
        it "creates default settings from the existing layouts" {
            write(&clone, "App/ui/layouts/B.json", "{}");
            write(&clone, "App/ui/layouts/A.json", "{}");

            let settings = repo.get_layout_settings(&ctx, None).unwrap();

            assert_eq!(settings["pages"]["order"], json!(["A", "B"]));
            assert!(clone.join("App/ui/Settings.json").is_file());
        }
    }

    describe "layout sets" {
        it "routes requests to the set folder" {
            add_layout_sets(&clone, &["form"]);
            write(&clone, "App/ui/form/layouts/Side1.json", &layout(&["x"]).to_string());

            let layouts = repo.get_form_layouts(&ctx, Some(&set("form"))).unwrap();
            assert_eq!(layouts["Side1"], layout(&["x"]));
        }

        it "ignores the set name when the app has no sets" {
            write(&clone, "App/ui/layouts/Side1.json", &layout(&["x"]).to_string());

            let layouts = repo.get_form_layouts(&ctx, Some(&set("form"))).unwrap();
            assert_eq!(layouts.len(), 1);
        }

        it "requires a set name when the app has sets" {
            add_layout_sets(&clone, &["form"]);
            let result = repo.get_form_layouts(&ctx, None);
            assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        }

        it "fails for sets that are not configured" {
            add_layout_sets(&clone, &["form"]);
            let result = repo.get_form_layouts(&ctx, Some(&set("other")));
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }

        it "moves existing files into a newly configured set" {
            write(&clone, "App/ui/layouts/Side1.json", &layout(&["x"]).to_string());
            write(&clone, "App/ui/RuleHandler.js", "var ruleHandlerObject = {};");
            write(
                &clone,
                "App/config/applicationmetadata.json",
                r#"{"dataTypes":[{"id":"ref-data-as-pdf"},{"id":"model","appLogic":{"classRef":"App.Model"}}]}"#,
            );

            let sets = repo.configure_layout_set(&ctx, &set("form")).unwrap();

            assert_eq!(sets.sets[0].id, "form");
            assert_eq!(sets.sets[0].data_type.as_deref(), Some("model"));
            assert_eq!(sets.sets[0].tasks, Some(vec!["Task_1".to_string()]));
            assert!(repo.uses_layout_sets(&ctx).unwrap());
            assert!(clone.join("App/ui/form/layouts/Side1.json").is_file());
            assert!(clone.join("App/ui/form/RuleHandler.js").is_file());
            assert!(!clone.join("App/ui/layouts").exists());
        }

        it "refuses to configure sets twice" {
            add_layout_sets(&clone, &["form"]);
            let result = repo.configure_layout_set(&ctx, &set("second"));
            assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        }

        it "adds a set and rejects duplicates" {
            add_layout_sets(&clone, &["form"]);
            let config = LayoutSetConfig {
                id: "receipt".to_string(),
                tasks: Some(vec!["Task_2".to_string()]),
                ..Default::default()
            };

            let sets = repo.add_layout_set(&ctx, config.clone()).unwrap();
            assert_eq!(sets.sets.len(), 2);
            assert!(clone.join("App/ui/receipt/layouts").is_dir());

            let again = repo.add_layout_set(&ctx, config);
            assert!(matches!(again, Err(ServiceError::BadRequest(_))));
        }

        it "keeps keys it does not know when adding a set" {
            write(
                &clone,
                "App/ui/layout-sets.json",
                &json!({
                    "$schema": LAYOUT_SETS_SCHEMA_URL,
                    "uiSettings": { "hideCloseButton": true },
                    "sets": [
                        { "id": "form", "dataType": "model", "tasks": ["Task_1"], "type": "subform" }
                    ]
                })
                .to_string(),
            );
            let config = LayoutSetConfig {
                id: "receipt".to_string(),
                ..Default::default()
            };

            repo.add_layout_set(&ctx, config).unwrap();

            let stored = read_json(&clone, "App/ui/layout-sets.json");
            assert_eq!(stored["uiSettings"], json!({ "hideCloseButton": true }));
            assert_eq!(stored["sets"][0]["type"], "subform");
            assert_eq!(stored["sets"][0]["dataType"], "model");
            assert_eq!(stored["sets"][1], json!({ "id": "receipt" }));
        }

        it "cannot add a set before sets are configured" {
            let config = LayoutSetConfig {
                id: "receipt".to_string(),
                ..Default::default()
            };
            let result = repo.add_layout_set(&ctx, config);
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
    }

    describe "rules" {
        it "reports a missing rule handler as not found" {
            let result = repo.get_rule_handler(&ctx, None);
            assert!(result.as_ref().is_err_and(ServiceError::is_not_found));
        }

        it "stores the rule handler verbatim" {
            let script = "var conditionalRuleHandlerObject = {};\n";
            repo.save_rule_handler(&ctx, None, script).unwrap();
            assert_eq!(repo.get_rule_handler(&ctx, None).unwrap(), script);
        }

        it "wraps legacy rule configuration under data" {
            write(&clone, "App/ui/RuleConfiguration.json", r#"{"ruleConnection":{}}"#);

            let text = repo.get_rule_config(&ctx, None).unwrap();
            let config: Value = serde_json::from_str(&text).unwrap();

            assert_eq!(config, json!({ "data": { "ruleConnection": {} } }));
            assert_eq!(read_json(&clone, "App/ui/RuleConfiguration.json"), config);
        }

        it "keeps rule configuration per layout set" {
            add_layout_sets(&clone, &["form"]);
            let config = json!({ "data": { "ruleConnection": {}, "conditionalRendering": {} } });

            repo.save_rule_config(&ctx, Some(&set("form")), &config).unwrap();

            assert_eq!(read_json(&clone, "App/ui/form/RuleConfiguration.json"), config);
        }
    }

    describe "app information" {
        it "returns None for missing widget settings and option lists" {
            assert_eq!(repo.get_widget_settings(&ctx).unwrap(), None);
            assert_eq!(repo.get_option_list_ids(&ctx).unwrap(), None);
        }

        it "lists option list ids" {
            write(&clone, "App/options/countries.json", "[]");
            write(&clone, "App/options/animals.json", "[]");
            write(&clone, "App/options/readme.md", "");

            let ids = repo.get_option_list_ids(&ctx).unwrap();
            assert_eq!(ids, Some(vec!["animals".to_string(), "countries".to_string()]));
        }

        it "reads library versions" {
            write(
                &clone,
                "App/App.csproj",
                r#"<Project><ItemGroup><PackageReference Include="Altinn.App.Api" Version="8.0.0" /></ItemGroup></Project>"#,
            );
            write(
                &clone,
                "App/views/Home/Index.cshtml",
                r#"<script src="https://altinncdn.no/toolkits/altinn-app-frontend/4/altinn-app-frontend.js"></script>"#,
            );

            let version = repo.get_app_version(&ctx).unwrap();
            assert_eq!(version.backend_version.as_deref(), Some("8.0.0"));
            assert_eq!(version.frontend_version.as_deref(), Some("4"));
        }
    }
}
