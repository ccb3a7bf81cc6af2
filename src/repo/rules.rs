use serde_json::{json, Value};

use super::{read_text, write_json, write_text, EditingContext, Repository};
use crate::error::ServiceResult;
use crate::validation::LayoutSetName;

const RULE_HANDLER_FILE: &str = "RuleHandler.js";
const RULE_CONFIG_FILE: &str = "RuleConfiguration.json";

impl Repository {
    /// The rule handler script, verbatim.
    pub fn get_rule_handler(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
    ) -> ServiceResult<String> {
        let path = self.ui_dir(ctx, layout_set)?.join(RULE_HANDLER_FILE);
        read_text(&path, "Rule handler")
    }

    pub fn save_rule_handler(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        content: &str,
    ) -> ServiceResult<()> {
        let path = self.ui_dir(ctx, layout_set)?.join(RULE_HANDLER_FILE);
        write_text(&path, content)?;
        tracing::info!("Saved rule handler for {}/{}", ctx.org, ctx.repo);
        Ok(())
    }

    /// The rule configuration as JSON text.
    ///
    /// Documents written before rules were nested under `data` are wrapped as
    /// `{ "data": <document> }` and the wrapped form is written back.
    pub fn get_rule_config(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
    ) -> ServiceResult<String> {
        let path = self.ui_dir(ctx, layout_set)?.join(RULE_CONFIG_FILE);
        let text = read_text(&path, "Rule configuration")?;
        let config: Value = serde_json::from_str(&text)?;
        if config.get("data").is_some() {
            return Ok(text);
        }

        let wrapped = json!({ "data": config });
        write_json(&path, &wrapped)?;
        tracing::info!("Moved rule configuration under data for {}/{}", ctx.org, ctx.repo);
        Ok(serde_json::to_string(&wrapped)?)
    }

    pub fn save_rule_config(
        &self,
        ctx: &EditingContext,
        layout_set: Option<&LayoutSetName>,
        config: &Value,
    ) -> ServiceResult<()> {
        let path = self.ui_dir(ctx, layout_set)?.join(RULE_CONFIG_FILE);
        write_json(&path, config)?;
        tracing::info!("Saved rule configuration for {}/{}", ctx.org, ctx.repo);
        Ok(())
    }
}
