// All LLM prompt constants for the Generation module.
// The delimiter and the wording of each block are content contracts with
// the model; change them in lockstep with the parsers that consume them.

/// Token separating extracted questions in the model's reply. Chosen for
/// being vanishingly unlikely to occur inside real form text.
pub const QUESTION_DELIMITER: &str = "*#*";

/// Question extraction prompt. Replace `{delimiter}` and `{html}` before
/// sending. Instructs the model to list every input-field question, carry
/// character limits as a「（300字以内）」style suffix, and emit nothing but
/// delimiter-separated question text.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"以下のHTMLはエントリーシート(ES)の入力フォームです。
このHTMLから入力欄に対応する質問文を抽出し、リストアップしてください。
質問に文字数制限がある場合は、「（300字以内）」のような形で質問文の末尾に追加してください。
質問のみをシンプルに抽出し、各質問の間には{delimiter}を必ず挿入してください。
質問文には、質問番号やIDやHTMLタグなどは含めないでください。

例：
志望動機を教えてください。（400字以内）{delimiter}学生時代に力を入れたことは何ですか？（300字以内）{delimiter}あなたの強みを教えてください。

以下のHTMLを分析してください:
{html}"#;

/// Answer prompt preamble. Replace `{question}` and `{style_directives}`;
/// the company and applicant sections are appended by the prompt builder.
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"あなたは就職活動中の応募者として、エントリーシートの質問に回答します。
以下の質問に対して、後述の企業情報と応募者の経歴情報を踏まえた回答を作成してください。

【質問】
{question}

{style_directives}

"#;

/// Formatting rules appended to every answer prompt.
pub const ANSWER_STYLE_DIRECTIVES: &str = r#"回答作成の条件:
- 自然な文章のみで回答し、箇条書きや記号、マークダウン記法は使用しないこと
- 「です・ます」調の丁寧な文体で統一すること
- 質問文に文字数制限がある場合は、その制限内に収めること
- 質問の繰り返しや前置き、補足説明は書かず、回答本文のみを出力すること"#;
