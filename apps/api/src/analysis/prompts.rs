// All LLM prompt constants for the analysis module.
// Prompt design is the first line of defense: every field the schema expects
// is spelled out with its type and range so parsing rarely has to fall back.

/// System prompt for the two-URL comparison.
pub const COMPARISON_SYSTEM: &str = "You are an SEO specialist comparing a blog post \
    against a competitor's post. Base every finding on the supplied article content.";

/// Comparison prompt template.
/// Replace: {user_url}, {competitor_url}, {url1_content}, {url2_content},
///          {url1_word_count}, {url2_word_count}
pub const COMPARISON_PROMPT_TEMPLATE: &str = r#"Analyze and compare the two blog contents below and provide a detailed SEO comparison.

Article 1 ({user_url}) Content:
{url1_content}

Article 2 ({competitor_url}) Content:
{url2_content}

Word Count Data (measured, use these exact numbers):
- Article 1 Word Count: {url1_word_count}
- Article 2 Word Count: {url2_word_count}

Based on your analysis, return the following:

1. Missing SEO Keywords in Article 1
   - High-impact keywords present in Article 2 but not in Article 1.
   - Real, rankable search terms or phrases users might type into Google.
2. Suggested Keywords
   - Additional keywords Article 1 should target that neither article covers well.
3. Meta Title Comparison
   - The meta title of each article (infer it from the main heading if not explicit).
4. Performance Scores
   - For each missing and each suggested keyword, a score from 0 to 100 estimating its SEO
     opportunity from search volume and competition. One score per keyword, same order.
5. Meta Title Enhancement
   - One stronger, SEO-optimized meta title for Article 1 that includes missing or
     high-ranking keywords and improves clarity, click appeal and intent match.

Return a JSON object with this EXACT schema:
{
  "meta_info_comparison": {
    "url1_title": "string",
    "url2_title": "string"
  },
  "missing_keywords": ["string"],
  "suggested_keywords": ["string"],
  "word_count_comparison": {
    "url1_word_count": 0,
    "url2_word_count": 0
  },
  "performance": {
    "missing_keywords_perf": [0],
    "suggested_keywords_perf": [0]
  },
  "improved_meta_title": "string"
}"#;

/// System prompt for the single-URL audit.
pub const AUDIT_SYSTEM: &str = r#"You are an SEO assistant. Extract the blog URL from the user's message, read that page and analyze its content.

Produce:
1. Overall SEO score (0-100)
2. Keyword usage score (0-100)
3. Content quality score (0-100)
4. At least 5 missing but relevant keywords for better Google ranking
5. Feedback on content gaps and how to close them (at least 3 items)
6. Recommendations for the title, body content and heading usage (at least 3 items)
7. Feedback on the heading structure (H1/H2/H3) of the page
8. What the content already does well
9. Industry tips for this niche (at least 2 items)
10. The target audience and the 2-3 core topics the blog focuses on, in one sentence

Title formulas you can model suggestions on:
"X Easy Ways to [accomplish something]", "X [Common problems] with [niche topic] and How to Fix Them", "The Beginner's Guide to [niche topic]".

Return a JSON object with this EXACT schema:
{
  "overall_seo_score": 0,
  "keyword_usage_score": 0,
  "content_quality_score": 0,
  "missing_keywords": ["string"],
  "feedback": ["string"],
  "recommendation": ["string"],
  "seo_headings_feedback": ["string"],
  "strong_content_feedback": ["string"],
  "industry_tip": ["string"],
  "target_audience": "string"
}
Scores are integers from 0 to 100."#;

/// Fills `{name}` placeholders in a single pass, so substituted values that
/// happen to contain placeholder text are left alone.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
