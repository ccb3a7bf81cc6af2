//! Resource metadata and policies kept in an organisation's resource repository.
//!
//! Layout: `<id>/<id>.json` for the resource and `<id>/<id>.policy.json` for its policy.

use std::path::PathBuf;

use super::{read_json, write_json, EditingContext, Repository};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Resource, ResourceListItem, ResourcePolicy, ResourceValidation, REQUIRED_LANGUAGES,
};
use crate::validation::ensure_file_name;

/// Name of the repository holding an organisation's resources.
pub fn resource_repository_name(org: &str) -> String {
    format!("{org}-resources")
}

impl Repository {
    pub fn list_resources(&self, ctx: &EditingContext) -> ServiceResult<Vec<ResourceListItem>> {
        let clone = self.clone_dir(ctx)?;
        let mut items = Vec::new();
        for entry in std::fs::read_dir(&clone)? {
            let dir = entry?.path();
            let Some(id) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let file = dir.join(format!("{id}.json"));
            if !file.is_file() {
                continue;
            }
            match read_json::<Resource>(&file, "Resource") {
                Ok(resource) => items.push(ResourceListItem::from(&resource)),
                Err(e) => tracing::warn!("Skipping unreadable resource {}: {}", id, e),
            }
        }
        items.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(items)
    }

    pub fn get_resource(&self, ctx: &EditingContext, id: &str) -> ServiceResult<Resource> {
        let path = self.resource_path(ctx, id)?;
        read_json(&path, &format!("Resource {id}"))
    }

    /// Create a resource. Fails with `Conflict` when the identifier is taken.
    pub fn add_resource(&self, ctx: &EditingContext, resource: &Resource) -> ServiceResult<()> {
        let path = self.resource_path(ctx, &resource.identifier)?;
        if path.exists() {
            return Err(ServiceError::Conflict(format!(
                "Resource {} already exists",
                resource.identifier
            )));
        }
        write_json(&path, resource)?;
        tracing::info!("Created resource {} in {}/{}", resource.identifier, ctx.org, ctx.repo);
        Ok(())
    }

    pub fn update_resource(
        &self,
        ctx: &EditingContext,
        id: &str,
        resource: &Resource,
    ) -> ServiceResult<()> {
        if resource.identifier != id {
            return Err(ServiceError::bad_request(
                "Resource identifier does not match the requested id",
            ));
        }
        let path = self.resource_path(ctx, id)?;
        write_json(&path, resource)?;
        tracing::info!("Updated resource {} in {}/{}", id, ctx.org, ctx.repo);
        Ok(())
    }

    /// The resource's policy, or an empty default policy when none is stored yet.
    pub fn get_policy(&self, ctx: &EditingContext, id: &str) -> ServiceResult<ResourcePolicy> {
        let resource_path = self.resource_path(ctx, id)?;
        if !resource_path.is_file() {
            return Err(ServiceError::not_found(format!("Resource {id} not found")));
        }
        let path = self.policy_path(ctx, id)?;
        if !path.is_file() {
            return Ok(ResourcePolicy::default());
        }
        read_json(&path, &format!("Policy for {id}"))
    }

    pub fn save_policy(
        &self,
        ctx: &EditingContext,
        id: &str,
        policy: &ResourcePolicy,
    ) -> ServiceResult<()> {
        if !self.resource_path(ctx, id)?.is_file() {
            return Err(ServiceError::not_found(format!("Resource {id} not found")));
        }
        write_json(&self.policy_path(ctx, id)?, policy)?;
        tracing::info!("Saved policy for {} in {}/{}", id, ctx.org, ctx.repo);
        Ok(())
    }

    fn resource_path(&self, ctx: &EditingContext, id: &str) -> ServiceResult<PathBuf> {
        ensure_file_name("Resource", id)?;
        Ok(self.clone_dir(ctx)?.join(id).join(format!("{id}.json")))
    }

    fn policy_path(&self, ctx: &EditingContext, id: &str) -> ServiceResult<PathBuf> {
        ensure_file_name("Resource", id)?;
        Ok(self
            .clone_dir(ctx)?
            .join(id)
            .join(format!("{id}.policy.json")))
    }
}

/// Check a resource for the fields required before it can be published.
pub fn validate_resource(resource: &Resource) -> ResourceValidation {
    let mut errors = Vec::new();

    if resource.identifier.trim().is_empty() {
        errors.push("identifier: missing".to_string());
    }
    for language in REQUIRED_LANGUAGES {
        if resource.title.get(language).map_or(true, |t| t.trim().is_empty()) {
            errors.push(format!("title: missing translation for {language}"));
        }
        if resource
            .description
            .get(language)
            .map_or(true, |t| t.trim().is_empty())
        {
            errors.push(format!("description: missing translation for {language}"));
        }
        if resource.is_delegable() {
            let missing = resource
                .right_description
                .as_ref()
                .and_then(|d| d.get(language))
                .map_or(true, |t| t.trim().is_empty());
            if missing {
                errors.push(format!("rightDescription: missing translation for {language}"));
            }
        }
    }
    if resource.resource_type.is_none() {
        errors.push("resourceType: missing".to_string());
    }
    if resource.status.is_none() {
        errors.push("status: missing".to_string());
    }

    ResourceValidation {
        status: if errors.is_empty() { 200 } else { 400 },
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceStatus, ResourceType, Translations};

    fn translations(text: &str) -> Translations {
        REQUIRED_LANGUAGES
            .iter()
            .map(|lang| (lang.to_string(), text.to_string()))
            .collect()
    }

    fn complete_resource() -> Resource {
        Resource {
            identifier: "skjema-1".to_string(),
            title: translations("Title"),
            description: translations("Description"),
            right_description: Some(translations("Rights")),
            homepage: None,
            status: Some(ResourceStatus::UnderDevelopment),
            resource_type: Some(ResourceType::Default),
            delegable: None,
            keywords: None,
        }
    }

    #[test]
    fn complete_resource_is_valid() {
        let validation = validate_resource(&complete_resource());
        assert_eq!(validation.status, 200);
        assert!(validation.errors.is_empty());
    }

    #[test]
    fn right_description_only_required_when_delegable() {
        let mut resource = complete_resource();
        resource.right_description = None;
        assert_eq!(validate_resource(&resource).errors.len(), 3);

        resource.delegable = Some(false);
        assert!(validate_resource(&resource).errors.is_empty());
    }

    #[test]
    fn missing_translation_is_reported_per_language() {
        let mut resource = complete_resource();
        resource.title.remove("nn");
        let validation = validate_resource(&resource);
        assert_eq!(validation.status, 400);
        assert_eq!(validation.errors, vec!["title: missing translation for nn"]);
    }
}
