//! Prompt Builder — assembles the per-question answer prompt.
//!
//! Pure and deterministic: (question, company info, profile, company name)
//! in, prompt text out. No I/O, no failure paths.

use crate::generation::prompts::{ANSWER_PROMPT_TEMPLATE, ANSWER_STYLE_DIRECTIVES};
use crate::models::profile::ApplicantProfile;
use crate::models::research::CompanyInfo;

/// Builds the full prompt for one question.
///
/// Layout: preamble with the literal question and the style directive
/// block, then a company-information section (a generic one-liner when no
/// usable company info exists), then an applicant-background section that
/// is dropped entirely when no profile is available. Empty fields never
/// produce a header.
pub fn build_answer_prompt(
    question: &str,
    company_info: Option<&CompanyInfo>,
    profile: Option<&ApplicantProfile>,
    company_name: &str,
) -> String {
    let mut prompt = ANSWER_PROMPT_TEMPLATE
        .replace("{style_directives}", ANSWER_STYLE_DIRECTIVES)
        .replace("{question}", question);

    prompt.push_str("【企業情報】\n");
    match company_info {
        Some(info) if !info.name.is_empty() => {
            push_section(&mut prompt, "■企業理念・バリュー", &info.philosophy);
            push_section(&mut prompt, "■求める人材像", &info.talent_needs);
            push_section(&mut prompt, "■キャリアパス", &info.career_path);
        }
        _ => {
            prompt.push_str(&format!(
                "{company_name}という企業についての質問です。一般的な応募者として回答してください。\n\n"
            ));
        }
    }

    if let Some(profile) = profile {
        prompt.push_str("【応募者の経歴情報】\n");
        push_section(&mut prompt, "■職務経歴", &profile.work);
        push_section(&mut prompt, "■スキル", &profile.skills);
        push_section(&mut prompt, "■自己PR", &profile.self_pr);
        push_section(&mut prompt, "■将来の目標", &profile.future_goals);
    }

    prompt
}

fn push_section(prompt: &mut String, header: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    prompt.push_str(header);
    prompt.push('\n');
    prompt.push_str(body);
    prompt.push_str("\n\n");
}
