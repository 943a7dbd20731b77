// Company research: cache-first resolution of three independent search
// facets (philosophy, career path, desired-talent profile).
// All search calls go through search_client — no direct HTTP here.

pub mod cache;
pub mod facets;
pub mod resolver;
