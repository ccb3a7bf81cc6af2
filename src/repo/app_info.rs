use serde_json::Value;

use super::{json_file_stems, read_json, EditingContext, Repository};
use crate::error::ServiceResult;
use crate::models::VersionResponse;

const WIDGET_SETTINGS_FILE: &str = "App/ui/widgetSettings.json";
const OPTIONS_DIR: &str = "App/options";
const PROJECT_FILE: &str = "App/App.csproj";
const INDEX_VIEW_FILE: &str = "App/views/Home/Index.cshtml";

const PACKAGE_REFERENCE_TAG: &str = "<PackageReference";
const BACKEND_PACKAGE_REFERENCE: &str = "Include=\"Altinn.App.Api\"";
const FRONTEND_SCRIPT_PREFIX: &str = "altinn-app-frontend/";

impl Repository {
    /// Widget settings, or `None` when the app has none.
    pub fn get_widget_settings(&self, ctx: &EditingContext) -> ServiceResult<Option<Value>> {
        let path = self.clone_dir(ctx)?.join(WIDGET_SETTINGS_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path, "Widget settings").map(Some)
    }

    /// Ids of the static option lists, or `None` when the app has no options folder.
    pub fn get_option_list_ids(&self, ctx: &EditingContext) -> ServiceResult<Option<Vec<String>>> {
        let dir = self.clone_dir(ctx)?.join(OPTIONS_DIR);
        if !dir.is_dir() {
            return Ok(None);
        }
        json_file_stems(&dir).map(Some)
    }

    /// Library versions read from the project file and the index view.
    pub fn get_app_version(&self, ctx: &EditingContext) -> ServiceResult<VersionResponse> {
        let clone = self.clone_dir(ctx)?;
        let backend_version = std::fs::read_to_string(clone.join(PROJECT_FILE))
            .ok()
            .and_then(|project| backend_version(&project));
        let frontend_version = std::fs::read_to_string(clone.join(INDEX_VIEW_FILE))
            .ok()
            .and_then(|view| frontend_version(&view));
        Ok(VersionResponse {
            backend_version,
            frontend_version,
        })
    }
}

/// Version of the `Altinn.App.Api` package reference, from either the
/// `Version` attribute or a nested `<Version>` element.
fn backend_version(project: &str) -> Option<String> {
    let mut rest = project;
    while let Some(start) = rest.find(PACKAGE_REFERENCE_TAG) {
        let element = &rest[start..];
        let end = element.find('>').map_or(element.len(), |i| i + 1);
        let tag = &element[..end];
        rest = &element[end..];
        if !tag.contains(BACKEND_PACKAGE_REFERENCE) {
            continue;
        }
        if let Some(version) = attribute(tag, "Version") {
            return Some(version);
        }
        if tag.ends_with("/>") {
            return None;
        }
        let body = &rest[..rest.find("</PackageReference>").unwrap_or(rest.len())];
        let (_, version) = body.split_once("<Version>")?;
        let (version, _) = version.split_once("</Version>")?;
        return Some(version.trim().to_string());
    }
    None
}

/// Value of `name="..."` inside a start tag.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let (at, _) = tag
        .match_indices(&needle)
        .find(|(at, _)| tag[..*at].ends_with(char::is_whitespace))?;
    let (value, _) = tag[at + needle.len()..].split_once('"')?;
    Some(value.to_string())
}

/// Path segment after `altinn-app-frontend/` in the frontend script url.
fn frontend_version(view: &str) -> Option<String> {
    let (_, rest) = view.split_once(FRONTEND_SCRIPT_PREFIX)?;
    let (version, _) = rest.split_once('/')?;
    (!version.is_empty()).then(|| version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_backend_version_from_package_reference() {
        let project = r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <ItemGroup>
    <PackageReference Include="Altinn.App.Api.Experimental" Version="1.0.0" />
    <PackageReference Include="Altinn.App.Api" Version="8.0.0">
      <CopyToOutputDirectory>lib\$(TargetFramework)\*.xml</CopyToOutputDirectory>
    </PackageReference>
  </ItemGroup>
</Project>"#;
        assert_eq!(backend_version(project), Some("8.0.0".to_string()));
        assert_eq!(backend_version("<Project />"), None);
    }

    #[test]
    fn reads_backend_version_listed_before_include() {
        let project = r#"<ItemGroup>
    <PackageReference Include="Other.Package" Version="2.0.0" />
    <PackageReference Version="8.1.0" Include="Altinn.App.Api" />
</ItemGroup>"#;
        assert_eq!(backend_version(project), Some("8.1.0".to_string()));
    }

    #[test]
    fn reads_backend_version_from_nested_element() {
        let project = r#"<ItemGroup>
    <PackageReference Include="Altinn.App.Api">
      <Version>8.2.1</Version>
    </PackageReference>
    <PackageReference Include="Other.Package" Version="2.0.0" />
</ItemGroup>"#;
        assert_eq!(backend_version(project), Some("8.2.1".to_string()));

        let unversioned = r#"<PackageReference Include="Altinn.App.Api" />
<PackageReference Include="Other.Package"><Version>2.0.0</Version></PackageReference>"#;
        assert_eq!(backend_version(unversioned), None);
    }

    #[test]
    fn reads_frontend_version_from_script_url() {
        let view = r#"<script src="https://altinncdn.no/toolkits/altinn-app-frontend/4/altinn-app-frontend.js"></script>"#;
        assert_eq!(frontend_version(view), Some("4".to_string()));
        assert_eq!(frontend_version("<html></html>"), None);
    }
}
