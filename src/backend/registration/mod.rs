//! GIS Member Registration
//!
//! The multi-tab registration form: per-tab draft saves, document uploads
//! and final submission.
//!
//! # Module Structure
//!
//! ```text
//! registration/
//! ├── mod.rs       - Module exports and documentation
//! ├── model.rs     - Profile and document rows, completeness rules
//! ├── db.rs        - Database operations
//! ├── storage.rs   - Upload directory and staged files
//! └── handlers.rs  - HTTP handlers
//! ```
//!
//! # Workflow
//!
//! 1. **Draft**: each tab is saved on its own; a patch only overwrites the
//!    fields it carries
//! 2. **Documents**: files are uploaded per kind; re-uploading a kind
//!    replaces the previous file
//! 3. **Submit**: allowed once every tab is complete and every required
//!    document is present; the profile then becomes read-only

pub mod model;

pub mod db;

pub mod storage;

pub mod handlers;

pub use handlers::{
    delete_document, get_registration, save_draft, submit_registration, upload_documents,
};
pub use model::{DocumentResponse, GisProfile, ProfileProgress, RegistrationResponse};
pub use storage::UploadStore;
