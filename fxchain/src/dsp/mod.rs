//! Sample-domain math shared by the filter catalog.

pub mod helpers;
pub mod intrinsics;
