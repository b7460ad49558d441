const TEMPLATE: &str = r#"Extract the following information from the given job post in the form of HTML/JS code:
- Company Name
- Company URL
- Company LinkedIn URL
- Job title
- Job Location
- Tech stack such as tools, programming languages, frameworks, and technologies, along with the certainty (Low, Medium or High) that the company is likely using the tool

Rules for assigning certainty to tools:
- If candidate experience with a tool is preferred or considered a bonus, the certainty is High.
- If a tool is explicitly mentioned as part of the company's tech stack, the certainty is High.
- If a tool is mentioned as part of a list of similar tools, the certainty is Low.
- Otherwise use Medium.

Answer with a single JSON object of this shape:
{
    "company": {"name": "company name", "url": "https://company.tld", "linkedin_url": "https://linkedin.com/company/..."},
    "title": "Job title",
    "location": {"country": "country name", "region": "state or province name", "city": "city name"},
    "tools": [{"name": "tool name 1", "certainty": "High"}, {"name": "tool name 2", "certainty": "Medium"}]
}

Use null for anything you are unable to extract.

Here is the code:
"#;

/// User message sent to the model for one job post page.
pub fn job_post_prompt(html: &str) -> String {
    let mut prompt = String::with_capacity(TEMPLATE.len() + html.len());
    prompt.push_str(TEMPLATE);
    prompt.push_str(html);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_appended_verbatim() {
        let prompt = job_post_prompt("<h1>{not a placeholder}</h1>");
        assert!(prompt.ends_with("Here is the code:\n<h1>{not a placeholder}</h1>"));
        assert!(prompt.contains("\"certainty\": \"High\""));
    }
}
