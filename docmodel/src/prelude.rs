//! Convenient re-exports of commonly used types from docmodel.
//!
//! ```ignore
//! use docmodel::prelude::*;
//! ```

pub use docmodel_core::{
    backend::{DataApiBackend, DataApiBackendBuilder},
    document::{DocumentExt, DocumentShape, Identified},
    error::{DataApiError, DataApiResult},
    id::{IdCodec, TaggedId},
    model::Model,
    params::{DeleteParams, FindManyParams, FindParams, UpdateParams},
    store::DataStore,
};
