use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The closed set of component kinds a layout may contain.
///
/// Serialized with the exact names used in layout files (`"Input"`, `"IFrame"`, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    Alert,
    Accordion,
    AccordionGroup,
    ActionButton,
    AddressComponent,
    AttachmentList,
    Button,
    ButtonGroup,
    Checkboxes,
    Custom,
    Datepicker,
    Dropdown,
    FileUpload,
    FileUploadWithTag,
    Grid,
    Group,
    Header,
    IFrame,
    Image,
    Input,
    InstanceInformation,
    InstantiationButton,
    Likert,
    Link,
    List,
    Map,
    MultipleSelect,
    NavigationBar,
    NavigationButtons,
    Panel,
    Paragraph,
    PrintButton,
    RadioButtons,
    Summary,
    TextArea,
}

/// Whether an item is rendered as a leaf or can hold children.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemType {
    #[serde(rename = "COMPONENT")]
    Component,
    #[serde(rename = "CONTAINER")]
    Container,
}

impl ComponentType {
    pub const ALL: [ComponentType; 35] = [
        Self::Alert,
        Self::Accordion,
        Self::AccordionGroup,
        Self::ActionButton,
        Self::AddressComponent,
        Self::AttachmentList,
        Self::Button,
        Self::ButtonGroup,
        Self::Checkboxes,
        Self::Custom,
        Self::Datepicker,
        Self::Dropdown,
        Self::FileUpload,
        Self::FileUploadWithTag,
        Self::Grid,
        Self::Group,
        Self::Header,
        Self::IFrame,
        Self::Image,
        Self::Input,
        Self::InstanceInformation,
        Self::InstantiationButton,
        Self::Likert,
        Self::Link,
        Self::List,
        Self::Map,
        Self::MultipleSelect,
        Self::NavigationBar,
        Self::NavigationButtons,
        Self::Panel,
        Self::Paragraph,
        Self::PrintButton,
        Self::RadioButtons,
        Self::Summary,
        Self::TextArea,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "Alert",
            Self::Accordion => "Accordion",
            Self::AccordionGroup => "AccordionGroup",
            Self::ActionButton => "ActionButton",
            Self::AddressComponent => "AddressComponent",
            Self::AttachmentList => "AttachmentList",
            Self::Button => "Button",
            Self::ButtonGroup => "ButtonGroup",
            Self::Checkboxes => "Checkboxes",
            Self::Custom => "Custom",
            Self::Datepicker => "Datepicker",
            Self::Dropdown => "Dropdown",
            Self::FileUpload => "FileUpload",
            Self::FileUploadWithTag => "FileUploadWithTag",
            Self::Grid => "Grid",
            Self::Group => "Group",
            Self::Header => "Header",
            Self::IFrame => "IFrame",
            Self::Image => "Image",
            Self::Input => "Input",
            Self::InstanceInformation => "InstanceInformation",
            Self::InstantiationButton => "InstantiationButton",
            Self::Likert => "Likert",
            Self::Link => "Link",
            Self::List => "List",
            Self::Map => "Map",
            Self::MultipleSelect => "MultipleSelect",
            Self::NavigationBar => "NavigationBar",
            Self::NavigationButtons => "NavigationButtons",
            Self::Panel => "Panel",
            Self::Paragraph => "Paragraph",
            Self::PrintButton => "PrintButton",
            Self::RadioButtons => "RadioButtons",
            Self::Summary => "Summary",
            Self::TextArea => "TextArea",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }

    pub fn item_type(&self) -> ItemType {
        if self.is_container() {
            ItemType::Container
        } else {
            ItemType::Component
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Group | Self::ButtonGroup | Self::Accordion | Self::AccordionGroup
        )
    }

    /// Child kinds a container accepts. Empty for components.
    pub fn valid_child_types(&self) -> &'static [ComponentType] {
        match self {
            Self::Group => &Self::ALL,
            Self::ButtonGroup => &[Self::Button],
            Self::Accordion => &[Self::Paragraph],
            Self::AccordionGroup => &[Self::Accordion],
            _ => &[],
        }
    }

    pub fn accepts_child(&self, child: ComponentType) -> bool {
        self.valid_child_types().contains(&child)
    }

    /// Location of the kind's definition in the layout JSON schema.
    pub fn property_path(&self) -> Option<&'static str> {
        let path = match self {
            Self::Alert => "definitions/alertComponent",
            Self::Accordion => "definitions/accordionComponent",
            Self::AccordionGroup => "definitions/accordionGroupComponent",
            Self::AddressComponent => "definitions/addressComponent",
            Self::AttachmentList => "definitions/attachmentListComponent",
            Self::Button => "definitions/actionButtonComponent",
            Self::ButtonGroup => "definitions/buttonGroupComponent",
            Self::Checkboxes | Self::Likert | Self::RadioButtons => {
                "definitions/radioAndCheckboxComponents"
            }
            Self::Datepicker => "definitions/datepickerComponent",
            Self::Dropdown | Self::MultipleSelect => "definitions/selectionComponents",
            Self::FileUpload => "definitions/fileUploadComponent",
            Self::FileUploadWithTag => "definitions/fileUploadWithTagComponent",
            Self::Grid => "definitions/gridComponent",
            Self::Group => "definitions/groupComponent",
            Self::Header => "definitions/headerComponent",
            Self::Image => "definitions/imageComponent",
            Self::Input => "definitions/inputComponent",
            Self::InstanceInformation => "definitions/instanceInformationComponent",
            Self::List => "definitions/listComponent",
            Self::Map => "definitions/mapComponent",
            Self::NavigationBar => "definitions/navigationBarComponent",
            Self::NavigationButtons => "definitions/navigationButtonsComponent",
            Self::Panel => "definitions/panelComponent",
            Self::Summary => "definitions/summaryComponent",
            Self::TextArea => "definitions/textAreaComponent",
            Self::ActionButton
            | Self::Custom
            | Self::IFrame
            | Self::InstantiationButton
            | Self::Link
            | Self::Paragraph
            | Self::PrintButton => return None,
        };
        Some(path)
    }

    /// Properties a freshly added item of this kind starts with, excluding
    /// `id`, `type`, `itemType` and `propertyPath`.
    pub fn default_properties(&self) -> Map<String, Value> {
        let value = match self {
            Self::Alert => json!({ "severity": "info" }),
            Self::ActionButton => json!({
                "textResourceBindings": { "title": "" },
                "buttonStyle": "primary",
            }),
            Self::AddressComponent => json!({ "dataModelBindings": {}, "simplified": true }),
            Self::AttachmentList => json!({
                "maxNumberOfAttachments": 1,
                "minNumberOfAttachments": 0,
            }),
            Self::Checkboxes | Self::RadioButtons => {
                json!({ "dataModelBindings": {}, "required": true })
            }
            Self::Custom => json!({ "tagName": "tag", "framework": "framework" }),
            Self::Datepicker => json!({
                "dataModelBindings": {},
                "minDate": "1900-01-01T12:00:00.000Z",
                "maxDate": "2100-01-01T12:00:00.000Z",
                "timeStamp": false,
                "required": true,
            }),
            Self::Dropdown => json!({ "dataModelBindings": {}, "optionsId": "", "required": true }),
            Self::MultipleSelect => json!({ "optionsId": "", "required": true }),
            Self::FileUpload => json!({
                "description": "",
                "displayMode": "list",
                "hasCustomFileEndings": false,
                "maxFileSizeInMB": 25,
                "maxNumberOfAttachments": 1,
                "minNumberOfAttachments": 1,
            }),
            Self::FileUploadWithTag => json!({
                "description": "",
                "displayMode": "list",
                "hasCustomFileEndings": false,
                "maxFileSizeInMB": 25,
                "maxNumberOfAttachments": 1,
                "minNumberOfAttachments": 1,
                "optionsId": "",
            }),
            Self::Header => json!({ "size": "L" }),
            Self::Image => json!({ "image": { "width": "100%", "align": "center" } }),
            Self::Input | Self::TextArea => json!({ "required": true }),
            Self::Map => json!({
                "centerLocation": { "latitude": 0, "longitude": 0 },
                "zoom": 1,
                "required": true,
            }),
            Self::Panel => json!({ "showIcon": true }),
            _ => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
