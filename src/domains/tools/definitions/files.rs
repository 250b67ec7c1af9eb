//! OneDrive / drive item endpoints.
//!
//! `get-drive-item-by-path` is overridden with a path transform: the item
//! path is encoded segment by segment so that its slashes survive.

use super::common::{odata_query, required_str};
use crate::domains::tools::ToolError;
use crate::domains::tools::catalog::{EndpointDescriptor, ParamDecl, ParamSchema};
use crate::domains::tools::overrides::{CallParams, OverrideRecord, OverrideRegistry};
use crate::domains::tools::params::encode_path_value;

const ITEM_PATH_PLACEHOLDER: &str = "{item-path}";

pub fn endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::new("list-drives", "GET", "/me/drives")
            .describe("List the drives available to the signed-in user.")
            .with_params(odata_query(&["select"])),
        EndpointDescriptor::new("get-drive-root-item", "GET", "/drives/{drive-id}/root")
            .describe("Get the root folder of a drive.")
            .with_param(ParamDecl::path("drive-id")),
        EndpointDescriptor::new(
            "list-folder-files",
            "GET",
            "/drives/{drive-id}/items/{driveItem-id}/children",
        )
        .describe("List the children of a folder.")
        .with_param(ParamDecl::path("drive-id"))
        .with_param(ParamDecl::path("driveItem-id"))
        .with_params(odata_query(&["filter", "select", "orderby", "top"])),
        EndpointDescriptor::new("get-drive-item-by-path", "GET", "/me/drive/root:/{item-path}")
            .describe("Get a drive item by its path relative to the drive root.")
            .with_param(ParamDecl::path("item-path"))
            .with_params(odata_query(&["select"])),
        EndpointDescriptor::new(
            "download-onedrive-file-content",
            "GET",
            "/drives/{drive-id}/items/{driveItem-id}/content",
        )
        .describe("Download the content of a file.")
        .with_param(ParamDecl::path("drive-id"))
        .with_param(ParamDecl::path("driveItem-id"))
        .media(),
        EndpointDescriptor::new(
            "upload-file-content",
            "PUT",
            "/drives/{drive-id}/items/{driveItem-id}/content",
        )
        .describe("Replace the content of a file (up to 250 MB).")
        .with_param(ParamDecl::path("drive-id"))
        .with_param(ParamDecl::path("driveItem-id"))
        .with_param(ParamDecl::body("body").with_schema(ParamSchema::string().required())),
        EndpointDescriptor::new(
            "delete-onedrive-file",
            "DELETE",
            "/drives/{drive-id}/items/{driveItem-id}",
        )
        .describe("Delete a drive item.")
        .with_param(ParamDecl::path("drive-id"))
        .with_param(ParamDecl::path("driveItem-id")),
    ]
}

pub fn register_overrides(registry: &mut OverrideRegistry) {
    registry.register(
        "get-drive-item-by-path",
        OverrideRecord::new()
            .field(
                "item-path",
                ParamSchema::string()
                    .describe("Path relative to the drive root, e.g. 'Documents/report.docx'")
                    .required(),
            )
            .path_transform(item_path),
    );
}

fn item_path(base: &str, params: &CallParams) -> Result<String, ToolError> {
    let raw = required_str(params, "item-path")?;
    let encoded = raw
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(encode_path_value)
        .collect::<Vec<_>>()
        .join("/");
    if encoded.is_empty() {
        return Err(ToolError::transform("'item-path' must name a file or folder"));
    }
    Ok(base.replace(ITEM_PATH_PLACEHOLDER, &encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::executor::CallExecutor;
    use crate::domains::tools::schema::EffectiveSchema;
    use serde_json::{Value, json};

    fn params(value: Value) -> CallParams {
        value.as_object().cloned().unwrap_or_default()
    }

    fn by_path() -> (EndpointDescriptor, OverrideRecord) {
        let endpoint = endpoints()
            .into_iter()
            .find(|e| e.name == "get-drive-item-by-path")
            .unwrap();
        let mut registry = OverrideRegistry::new();
        register_overrides(&mut registry);
        (endpoint, registry.get("get-drive-item-by-path").unwrap().as_ref().clone())
    }

    #[test]
    fn test_item_path_keeps_slashes() {
        let (endpoint, record) = by_path();
        let request = CallExecutor::prepare(
            &endpoint,
            Some(&record),
            &params(json!({ "item-path": "/Documents/Q1 report.docx", "select": "id,name" })),
        )
        .unwrap();

        assert_eq!(request.path, "/me/drive/root:/Documents/Q1%20report.docx");
        assert_eq!(request.query, vec![("$select".to_string(), "id,name".to_string())]);
    }

    #[test]
    fn test_item_path_schema_readded_by_override() {
        let (endpoint, record) = by_path();
        let schema = EffectiveSchema::build(&endpoint, Some(&record));
        assert!(schema.get("item-path").unwrap().is_required());
        assert!(schema.contains("fetchAllPages"));
    }

    #[test]
    fn test_item_path_rejects_empty() {
        assert!(item_path("/me/drive/root:/{item-path}", &params(json!({ "item-path": "//" }))).is_err());
    }

    #[test]
    fn test_download_is_raw() {
        let endpoint = endpoints()
            .into_iter()
            .find(|e| e.name == "download-onedrive-file-content")
            .unwrap();
        let request = CallExecutor::prepare(
            &endpoint,
            None,
            &params(json!({ "drive-id": "d1", "driveItem-id": "i1" })),
        )
        .unwrap();
        assert_eq!(request.path, "/drives/d1/items/i1/content");
        assert!(request.options.raw_response);
    }
}
