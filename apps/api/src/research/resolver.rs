//! Company Info Resolver — cache-first aggregation of the three research
//! facets.
//!
//! Flow: cache lookup → (miss) three concurrent facet searches, each with a
//! primary and one fallback query → assemble → persist.
//!
//! Degradation contract: an unresolved facet leaves its field empty and the
//! resolution still succeeds. The only hard failure is a missing search API
//! key on a cache miss.

use std::sync::Arc;

use chrono::Utc;
use futures::future;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::research::{CompanyInfo, CompanyResearchRow};
use crate::research::cache::ResearchCache;
use crate::research::facets::{assemble_company_info, Facet, FacetAnswer, FacetQueryTerms};
use crate::search_client::SearchProvider;

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("TAVILY_API_KEY is not set")]
    MissingApiKey,
}

pub struct CompanyResearcher {
    cache: Arc<dyn ResearchCache>,
    search: Arc<dyn SearchProvider>,
    api_key: Option<String>,
    terms: FacetQueryTerms,
}

impl CompanyResearcher {
    pub fn new(
        cache: Arc<dyn ResearchCache>,
        search: Arc<dyn SearchProvider>,
        api_key: Option<String>,
    ) -> Self {
        Self::with_terms(cache, search, api_key, FacetQueryTerms::default())
    }

    pub fn with_terms(
        cache: Arc<dyn ResearchCache>,
        search: Arc<dyn SearchProvider>,
        api_key: Option<String>,
        terms: FacetQueryTerms,
    ) -> Self {
        Self {
            cache,
            search,
            api_key,
            terms,
        }
    }

    /// Resolves company background for a prompt.
    ///
    /// A cache hit returns the stored fields verbatim with zero search
    /// calls. A miss requires the search API key, fans out all three facets
    /// concurrently, waits for every facet to settle, then persists the
    /// aggregate. A failed persist is logged and the aggregate is still
    /// returned.
    pub async fn resolve(
        &self,
        company_id: &str,
        company_name: &str,
    ) -> Result<CompanyInfo, ResearchError> {
        match self.cache.find_by_company_id(company_id).await {
            Ok(Some(row)) => {
                info!("Company research cache hit for {company_id}");
                return Ok(row.into());
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Company research cache lookup failed, treating as miss: {e}");
            }
        }

        let api_key = self.api_key.as_deref().ok_or(ResearchError::MissingApiKey)?;

        info!("Company research cache miss for {company_id}, searching");
        let answers = future::join_all(
            Facet::ALL
                .iter()
                .map(|&facet| self.resolve_facet(facet, api_key, company_name)),
        )
        .await;

        let resolved = answers.iter().filter(|a| !a.answer.is_empty()).count();
        info!("Company research resolved {resolved}/3 facets for {company_id}");

        let company_info = assemble_company_info(company_name, answers);

        let row = new_research_row(company_id, &company_info);
        if let Err(e) = self.cache.create(&row).await {
            warn!("Failed to persist company research for {company_id}: {e}");
        }

        Ok(company_info)
    }

    /// One facet worker: primary query, then one fallback when the primary
    /// errors or comes back without a usable answer. Never fails; a facet
    /// that exhausts both queries contributes an empty answer.
    async fn resolve_facet(&self, facet: Facet, api_key: &str, company_name: &str) -> FacetAnswer {
        let primary = self.terms.primary_query(facet, company_name);
        match self.search.search_with_answer(api_key, &primary).await {
            Ok(result) if result.has_answer() => {
                return FacetAnswer {
                    facet,
                    answer: result.answer,
                };
            }
            Ok(_) => {
                warn!(
                    "Facet {} primary query returned no answer, trying fallback",
                    facet.label()
                );
            }
            Err(e) => {
                warn!(
                    "Facet {} primary query failed ({e}), trying fallback",
                    facet.label()
                );
            }
        }

        let fallback = self.terms.fallback_query(facet, company_name);
        match self.search.search_with_answer(api_key, &fallback).await {
            Ok(result) if result.has_answer() => FacetAnswer {
                facet,
                answer: result.answer,
            },
            Ok(_) => {
                warn!("Facet {} unresolved, leaving field empty", facet.label());
                FacetAnswer {
                    facet,
                    answer: String::new(),
                }
            }
            Err(e) => {
                warn!(
                    "Facet {} fallback query failed ({e}), leaving field empty",
                    facet.label()
                );
                FacetAnswer {
                    facet,
                    answer: String::new(),
                }
            }
        }
    }
}

fn new_research_row(company_id: &str, info: &CompanyInfo) -> CompanyResearchRow {
    let now = Utc::now();
    CompanyResearchRow {
        id: Uuid::new_v4(),
        company_id: company_id.to_string(),
        company_name: info.name.clone(),
        philosophy: info.philosophy.clone(),
        career_path: info.career_path.clone(),
        talent_needs: info.talent_needs.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use crate::search_client::{SearchError, SearchResult};

    // ────────────────────────────────────────────────────────────────────
    // Test doubles
    // ────────────────────────────────────────────────────────────────────

    struct StubCache {
        stored: Option<CompanyResearchRow>,
        fail_find: bool,
        fail_create: bool,
        find_calls: AtomicU32,
        created: Mutex<Vec<CompanyResearchRow>>,
    }

    impl StubCache {
        fn empty() -> Self {
            StubCache {
                stored: None,
                fail_find: false,
                fail_create: false,
                find_calls: AtomicU32::new(0),
                created: Mutex::new(Vec::new()),
            }
        }

        fn with_row(row: CompanyResearchRow) -> Self {
            StubCache {
                stored: Some(row),
                ..StubCache::empty()
            }
        }
    }

    #[async_trait]
    impl ResearchCache for StubCache {
        async fn find_by_company_id(
            &self,
            _company_id: &str,
        ) -> anyhow::Result<Option<CompanyResearchRow>> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_find {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.stored.clone())
        }

        async fn create(&self, row: &CompanyResearchRow) -> anyhow::Result<()> {
            if self.fail_create {
                return Err(anyhow!("insert failed"));
            }
            self.created.lock().unwrap().push(row.clone());
            Ok(())
        }
    }

    type SearchScript = Box<dyn Fn(&str) -> Result<SearchResult, SearchError> + Send + Sync>;

    struct ScriptedSearch {
        script: SearchScript,
        calls: AtomicU32,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSearch {
        fn new(script: SearchScript) -> Self {
            ScriptedSearch {
                script,
                calls: AtomicU32::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn answering_everything(answer: &str) -> Self {
            let answer = answer.to_string();
            Self::new(Box::new(move |_| Ok(answered(&answer))))
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedSearch {
        async fn search_with_answer(
            &self,
            _api_key: &str,
            query: &str,
        ) -> Result<SearchResult, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            (self.script)(query)
        }
    }

    fn answered(answer: &str) -> SearchResult {
        SearchResult {
            results: vec![],
            answer: answer.to_string(),
        }
    }

    fn cached_row() -> CompanyResearchRow {
        CompanyResearchRow {
            id: Uuid::new_v4(),
            company_id: "7010001000000".to_string(),
            company_name: "株式会社サンプル".to_string(),
            philosophy: "P".to_string(),
            career_path: "C".to_string(),
            talent_needs: "T".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn researcher(
        cache: StubCache,
        search: ScriptedSearch,
        api_key: Option<&str>,
    ) -> (CompanyResearcher, Arc<StubCache>, Arc<ScriptedSearch>) {
        let cache = Arc::new(cache);
        let search = Arc::new(search);
        let resolver = CompanyResearcher::new(
            cache.clone(),
            search.clone(),
            api_key.map(|k| k.to_string()),
        );
        (resolver, cache, search)
    }

    // ────────────────────────────────────────────────────────────────────
    // Tests
    // ────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cache_hit_returns_stored_fields_with_zero_searches() {
        let (resolver, _cache, search) = researcher(
            StubCache::with_row(cached_row()),
            ScriptedSearch::answering_everything("unused"),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.name, "株式会社サンプル");
        assert_eq!(info.philosophy, "P");
        assert_eq!(info.career_path, "C");
        assert_eq!(info.talent_needs, "T");
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_needs_no_api_key() {
        let (resolver, _cache, search) = researcher(
            StubCache::with_row(cached_row()),
            ScriptedSearch::answering_everything("unused"),
            None,
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.philosophy, "P");
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_without_api_key_is_configuration_error() {
        let (resolver, _cache, search) = researcher(
            StubCache::empty(),
            ScriptedSearch::answering_everything("unused"),
            None,
        );

        let err = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap_err();

        assert!(matches!(err, ResearchError::MissingApiKey));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_resolves_all_facets_and_persists() {
        let script: SearchScript = Box::new(|query| {
            if query.contains("企業理念") {
                Ok(answered("理念の要約"))
            } else if query.contains("キャリアパス") {
                Ok(answered("キャリアの要約"))
            } else {
                Ok(answered("人材像の要約"))
            }
        });
        let (resolver, cache, search) = researcher(
            StubCache::empty(),
            ScriptedSearch::new(script),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.philosophy, "理念の要約");
        assert_eq!(info.career_path, "キャリアの要約");
        assert_eq!(info.talent_needs, "人材像の要約");
        // One primary query per facet, no fallbacks needed.
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);

        let created = cache.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].company_id, "7010001000000");
        assert_eq!(created[0].philosophy, "理念の要約");
        assert_eq!(created[0].career_path, "キャリアの要約");
        assert_eq!(created[0].talent_needs, "人材像の要約");
    }

    #[tokio::test]
    async fn test_failing_primary_promotes_fallback_answer() {
        let script: SearchScript = Box::new(|query| {
            if query.contains("企業理念 ミッション") {
                Err(SearchError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            } else if query.contains("理念 目指すもの") {
                Ok(answered("フォールバックの理念"))
            } else {
                Ok(answered("その他の要約"))
            }
        });
        let (resolver, _cache, search) = researcher(
            StubCache::empty(),
            ScriptedSearch::new(script),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.philosophy, "フォールバックの理念");
        // Philosophy used two queries, the other two facets one each.
        assert_eq!(search.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_primary_answer_also_triggers_fallback() {
        let script: SearchScript = Box::new(|query| {
            if query.contains("求める人材") {
                Ok(SearchResult::default())
            } else if query.contains("採用情報 募集要項") {
                Ok(answered("募集要項の要約"))
            } else {
                Ok(answered("その他の要約"))
            }
        });
        let (resolver, _cache, _search) = researcher(
            StubCache::empty(),
            ScriptedSearch::new(script),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.talent_needs, "募集要項の要約");
    }

    #[tokio::test]
    async fn test_facet_failing_both_queries_leaves_field_empty() {
        let script: SearchScript = Box::new(|query| {
            if query.contains("キャリア") {
                Err(SearchError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            } else {
                Ok(answered("要約"))
            }
        });
        let (resolver, cache, _search) = researcher(
            StubCache::empty(),
            ScriptedSearch::new(script),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.career_path, "");
        assert_eq!(info.philosophy, "要約");
        assert_eq!(info.talent_needs, "要約");
        // The partial aggregate is still persisted.
        assert_eq!(cache.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_still_returns_the_aggregate() {
        let cache = StubCache {
            fail_create: true,
            ..StubCache::empty()
        };
        let (resolver, _cache, _search) = researcher(
            cache,
            ScriptedSearch::answering_everything("要約"),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.philosophy, "要約");
    }

    #[tokio::test]
    async fn test_cache_lookup_failure_degrades_to_miss() {
        let cache = StubCache {
            fail_find: true,
            ..StubCache::empty()
        };
        let (resolver, _cache, search) = researcher(
            cache,
            ScriptedSearch::answering_everything("要約"),
            Some("tvly-key"),
        );

        let info = resolver
            .resolve("7010001000000", "株式会社サンプル")
            .await
            .unwrap();

        assert_eq!(info.philosophy, "要約");
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
    }
}
