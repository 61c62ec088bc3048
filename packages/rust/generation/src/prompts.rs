//! Prompt builders for the draft and optimization passes.

use articlesmith_shared::MatchedTask;

use crate::Draft;

/// Prompt for the first-pass draft, written to the persona.
pub fn draft_prompt(task: &MatchedTask) -> String {
    let persona = &task.persona;
    let keyword = &task.keyword;
    format!(
        r#"あなたは介護・福祉分野に詳しいプロのWebライターです。
以下のペルソナに向けて、悩みに寄り添い具体的な解決策を示す記事を書いてください。

# ペルソナ
- 人物像: {detail}
- 悩み: {worry}
- 状況: {scenario}
- 文体の指示: {tone}

# キーワード
- メインキーワード: {main}
- サブキーワード: {sub}
- 検索意図: {intent}
- タイトル案: {title_idea}

# 執筆ルール
- 本文はMarkdown形式で、見出し(##)を3つ以上含めること
- 本文は2000文字以上
- ペルソナの状況に即した具体例を入れること

# 出力形式
次のキーを持つJSONオブジェクトのみを出力してください。説明文は不要です。
{{"title": "記事タイトル", "body": "Markdown形式の本文", "slug": "英小文字とハイフンのURLスラッグ"}}"#,
        detail = persona.persona_detail,
        worry = persona.worry_description,
        scenario = persona.context_scenario,
        tone = persona.tone_instruction,
        main = keyword.main_keyword,
        sub = keyword.sub_keywords,
        intent = keyword.user_intent,
        title_idea = keyword.title_idea,
    )
}

/// Prompt for the SEO pass over an existing draft.
pub fn optimization_prompt(draft: &Draft, task: &MatchedTask) -> String {
    let keyword = &task.keyword;
    format!(
        r#"あなたはSEOに精通した編集者です。以下の下書き記事を検索エンジン向けに最適化してください。

# SEO要件
- メインキーワード「{main}」をタイトルと最初の段落に自然に含める
- サブキーワード: {sub}
- 検索意図: {intent}
- meta_title は32文字以内でメインキーワードを含める
- meta_description は120文字以内で記事の要点を要約する
- 本文の内容・文体は維持し、見出し構成と表現を改善する

# 下書き
タイトル: {title}
スラッグ: {slug}

{body}

# 出力形式
次のキーを持つJSONオブジェクトのみを出力してください。説明文は不要です。
{{"title": "最適化したタイトル", "body": "最適化したMarkdown本文", "slug": "URLスラッグ", "meta_title": "メタタイトル", "meta_description": "メタディスクリプション"}}"#,
        main = keyword.main_keyword,
        sub = keyword.sub_keywords,
        intent = keyword.user_intent,
        title = draft.title,
        slug = draft.slug,
        body = draft.body,
    )
}
