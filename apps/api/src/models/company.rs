use serde::{Deserialize, Serialize};

/// Minimal company identity returned by the corporate registry search.
/// `company_id` is the registry's corporate number and keys the research cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyBasicInfo {
    pub company_id: String,
    pub company_name: String,
}
