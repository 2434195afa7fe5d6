use crate::protocol::types::*;
use serde::{Deserialize, Serialize};

// Core messages, shared by every protocol

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Acknowledge {}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProtocolException {
    pub error_code: u32,
    pub error_message: String,
}

// Discovery

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetResources {
    pub uri: Uri,
}

/// One resource of a (possibly multi-part) listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetResourcesResponse {
    pub resource: Resource,
}

// Store

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetObject {
    pub uri: Uri,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PutObject {
    pub data_object: DataObject,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeleteObject {
    pub uri: Uri,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Object {
    pub data_object: DataObject,
}
