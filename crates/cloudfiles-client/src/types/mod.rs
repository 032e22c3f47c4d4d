//! Values exchanged with the façade: listings, account and CDN state,
//! listing parameters and upload data.

mod account_info;
mod cdn_info;
mod content_type;
mod list_params;
mod listing;
mod object_data;

pub use account_info::AccountInfo;
pub use cdn_info::{CdnInfo, DEFAULT_CDN_TTL};
pub use content_type::{DIRECTORY_CONTENT_TYPE, guess_content_type};
pub use list_params::{ListParams, ObjectListParams};
pub use listing::{ContainerInfo, ObjectInfo};
pub use object_data::ObjectData;
