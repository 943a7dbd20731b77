//! Facet definitions and query construction for company research.
//!
//! Each facet resolves into exactly one `CompanyInfo` field, so concurrent
//! facet workers never contend: assembly is a fold over `(facet, answer)`
//! pairs rather than shared mutation.

use crate::models::research::CompanyInfo;

/// One of the three independent company-research dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Philosophy,
    CareerPath,
    TalentNeeds,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Philosophy, Facet::CareerPath, Facet::TalentNeeds];

    /// Label used in degradation logs.
    pub fn label(&self) -> &'static str {
        match self {
            Facet::Philosophy => "philosophy",
            Facet::CareerPath => "career_path",
            Facet::TalentNeeds => "talent_needs",
        }
    }
}

/// Primary and fallback keyword terms for one facet.
#[derive(Debug, Clone)]
pub struct QueryPair {
    pub primary: String,
    pub fallback: String,
}

/// Keyword term sets appended to the company name when building search
/// queries. Overridable so tests can exercise query construction without
/// hitting the network.
#[derive(Debug, Clone)]
pub struct FacetQueryTerms {
    pub philosophy: QueryPair,
    pub career_path: QueryPair,
    pub talent_needs: QueryPair,
}

impl Default for FacetQueryTerms {
    fn default() -> Self {
        FacetQueryTerms {
            philosophy: QueryPair {
                primary: "企業理念 ミッション 価値観 経営理念".to_string(),
                fallback: "理念 目指すもの".to_string(),
            },
            career_path: QueryPair {
                primary: "社員 キャリアパス キャリア形成 成長機会 研修".to_string(),
                fallback: "社員インタビュー キャリア".to_string(),
            },
            talent_needs: QueryPair {
                primary: "求める人材 採用 人物像 採用基準".to_string(),
                fallback: "採用情報 募集要項".to_string(),
            },
        }
    }
}

impl FacetQueryTerms {
    fn pair(&self, facet: Facet) -> &QueryPair {
        match facet {
            Facet::Philosophy => &self.philosophy,
            Facet::CareerPath => &self.career_path,
            Facet::TalentNeeds => &self.talent_needs,
        }
    }

    pub fn primary_query(&self, facet: Facet, company_name: &str) -> String {
        format!("{} {}", company_name, self.pair(facet).primary)
    }

    pub fn fallback_query(&self, facet: Facet, company_name: &str) -> String {
        format!("{} {}", company_name, self.pair(facet).fallback)
    }
}

/// The outcome of one facet worker. An empty answer means the facet could
/// not be resolved and its field stays empty.
#[derive(Debug, Clone)]
pub struct FacetAnswer {
    pub facet: Facet,
    pub answer: String,
}

/// Folds facet answers into a `CompanyInfo`. Each facet writes only its own
/// field, so the fold is commutative across answer order.
pub fn assemble_company_info(
    company_name: &str,
    answers: impl IntoIterator<Item = FacetAnswer>,
) -> CompanyInfo {
    let mut info = CompanyInfo::empty(company_name);
    for FacetAnswer { facet, answer } in answers {
        match facet {
            Facet::Philosophy => info.philosophy = answer,
            Facet::CareerPath => info.career_path = answer,
            Facet::TalentNeeds => info.talent_needs = answer,
        }
    }
    info
}
