//! ICP criteria blocks and the matching rules applied to them
//!
//! Each block is independently optional on an ICP. Inside a block an empty
//! list (or an unset bound) is a wildcard. Comparisons ignore ASCII case.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::values::{Funding, Location, Tool};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyCriteria {
    pub countries: Vec<String>,
    pub industries: Vec<String>,
    pub min_headcount: Option<i64>,
    pub max_headcount: Option<i64>,
    pub funding_rounds: Vec<String>,
    pub investors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCriteria {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Keywords describing how a prospect works, looked for in job post text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessCriteria {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonCriteria {
    pub titles: Vec<String>,
    pub seniorities: Vec<String>,
    pub departments: Vec<String>,
}

/// Company attributes the company criteria look at
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyFacts<'a> {
    pub industry: Option<&'a str>,
    pub headcount: Option<i64>,
    pub hq_location: Option<&'a Location>,
    pub last_funding: Option<&'a Funding>,
}

fn eq_any(candidates: &[String], value: &str) -> bool {
    candidates.iter().any(|c| c.eq_ignore_ascii_case(value))
}

fn contains_any(needles: &[String], haystack: &str) -> bool {
    let haystack = haystack.to_ascii_lowercase();
    needles
        .iter()
        .any(|n| haystack.contains(&n.to_ascii_lowercase()))
}

impl CompanyCriteria {
    pub fn matches(&self, company: &CompanyFacts<'_>) -> bool {
        if !self.countries.is_empty() {
            let country = company.hq_location.and_then(|l| l.country.as_deref());
            if !country.is_some_and(|c| eq_any(&self.countries, c)) {
                return false;
            }
        }

        if !self.industries.is_empty() && !company.industry.is_some_and(|i| eq_any(&self.industries, i)) {
            return false;
        }

        if self.min_headcount.is_some() || self.max_headcount.is_some() {
            let Some(headcount) = company.headcount else {
                return false;
            };
            if self.min_headcount.is_some_and(|min| headcount < min)
                || self.max_headcount.is_some_and(|max| headcount > max)
            {
                return false;
            }
        }

        if !self.funding_rounds.is_empty() {
            let round = company.last_funding.and_then(|f| f.round_name.as_deref());
            if !round.is_some_and(|r| eq_any(&self.funding_rounds, r)) {
                return false;
            }
        }

        if !self.investors.is_empty() {
            let backed = company
                .last_funding
                .is_some_and(|f| f.investors.iter().any(|i| eq_any(&self.investors, i)));
            if !backed {
                return false;
            }
        }

        true
    }
}

/// Tools split by which side of the criteria they fall on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMatch {
    pub matched: Vec<String>,
    pub excluded: Vec<String>,
}

impl ToolMatch {
    /// At least one wanted tool and no unwanted ones.
    pub fn is_fit(&self) -> bool {
        !self.matched.is_empty() && self.excluded.is_empty()
    }
}

fn push_unique(into: &mut Vec<String>, name: &str) {
    if !into.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        into.push(name.to_owned());
    }
}

impl ToolCriteria {
    pub fn evaluate<'a, I>(&self, tools: I) -> ToolMatch
    where
        I: IntoIterator<Item = &'a Tool>,
    {
        let mut result = ToolMatch::default();
        for tool in tools {
            if eq_any(&self.exclude, &tool.name) {
                push_unique(&mut result.excluded, &tool.name);
            } else if eq_any(&self.include, &tool.name) {
                push_unique(&mut result.matched, &tool.name);
            }
        }
        result
    }
}

impl ProcessCriteria {
    /// Included keywords present in `text`, or `None` when an excluded
    /// keyword appears.
    pub fn evaluate(&self, text: &str) -> Option<Vec<String>> {
        if contains_any(&self.exclude, text) {
            return None;
        }
        let lowered = text.to_ascii_lowercase();
        Some(
            self.include
                .iter()
                .filter(|k| lowered.contains(&k.to_ascii_lowercase()))
                .cloned()
                .collect(),
        )
    }
}

impl PersonCriteria {
    pub fn matches(&self, title: Option<&str>) -> bool {
        let blocks = [&self.titles, &self.seniorities, &self.departments];
        if blocks.iter().all(|b| b.is_empty()) {
            return true;
        }
        let Some(title) = title else {
            return false;
        };
        blocks
            .iter()
            .all(|block| block.is_empty() || contains_any(block, title))
    }
}

/// The four criteria blocks of one ICP
#[derive(Debug, Clone, Default)]
pub struct IcpProfile {
    pub company: Option<CompanyCriteria>,
    pub tool: Option<ToolCriteria>,
    pub process: Option<ProcessCriteria>,
    pub person: Option<PersonCriteria>,
}

/// What an opportunity looks like to the matcher
#[derive(Debug, Clone, Default)]
pub struct IcpSubject<'a> {
    pub company: Option<CompanyFacts<'a>>,
    pub tools: Vec<&'a Tool>,
    pub texts: Vec<&'a str>,
    pub contacts: Vec<(Uuid, Option<&'a str>)>,
}

/// Result of evaluating an ICP against one opportunity.
///
/// Blocks the ICP leaves unset are reported as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcpMatch {
    pub company: Option<bool>,
    pub tools: Option<ToolMatch>,
    pub process_keywords: Option<Vec<String>>,
    pub matching_contacts: Option<Vec<Uuid>>,
}

impl IcpProfile {
    pub fn evaluate(&self, subject: &IcpSubject<'_>) -> IcpMatch {
        let company = self.company.as_ref().map(|criteria| {
            subject
                .company
                .as_ref()
                .is_some_and(|facts| criteria.matches(facts))
        });

        let tools = self
            .tool
            .as_ref()
            .map(|criteria| criteria.evaluate(subject.tools.iter().copied()));

        let process_keywords = self.process.as_ref().map(|criteria| {
            let mut found: Vec<String> = Vec::new();
            for text in &subject.texts {
                match criteria.evaluate(text) {
                    Some(keywords) => {
                        for k in keywords {
                            push_unique(&mut found, &k);
                        }
                    }
                    None => return Vec::new(),
                }
            }
            found
        });

        let matching_contacts = self.person.as_ref().map(|criteria| {
            subject
                .contacts
                .iter()
                .filter(|(_, title)| criteria.matches(*title))
                .map(|(id, _)| *id)
                .collect()
        });

        IcpMatch {
            company,
            tools,
            process_keywords,
            matching_contacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ToolCertainty;

    fn berlin() -> Location {
        Location {
            country: Some("Germany".into()),
            region: None,
            city: Some("Berlin".into()),
        }
    }

    #[test]
    fn empty_company_criteria_match_anything() {
        assert!(CompanyCriteria::default().matches(&CompanyFacts::default()));
    }

    #[test]
    fn company_criteria_all_must_hold() {
        let location = berlin();
        let funding = Funding {
            round_name: Some("Series A".into()),
            investors: vec!["Accel".into()],
            ..Default::default()
        };
        let facts = CompanyFacts {
            industry: Some("Software"),
            headcount: Some(120),
            hq_location: Some(&location),
            last_funding: Some(&funding),
        };

        let criteria = CompanyCriteria {
            countries: vec!["germany".into()],
            industries: vec!["software".into()],
            min_headcount: Some(50),
            max_headcount: Some(200),
            funding_rounds: vec!["series a".into()],
            investors: vec!["accel".into()],
        };
        assert!(criteria.matches(&facts));

        let too_small = CompanyCriteria {
            min_headcount: Some(500),
            ..criteria.clone()
        };
        assert!(!too_small.matches(&facts));
    }

    #[test]
    fn bound_against_missing_attribute_fails() {
        let criteria = CompanyCriteria {
            max_headcount: Some(10),
            ..Default::default()
        };
        assert!(!criteria.matches(&CompanyFacts::default()));
    }

    #[test]
    fn tool_match_splits_and_dedups() {
        let tools = vec![
            Tool::new("Docker", ToolCertainty::High),
            Tool::new("docker", ToolCertainty::Low),
            Tool::new("Jenkins", ToolCertainty::Medium),
            Tool::new("Excel", ToolCertainty::Low),
        ];
        let criteria = ToolCriteria {
            include: vec!["Docker".into(), "Kubernetes".into()],
            exclude: vec!["jenkins".into()],
        };
        let result = criteria.evaluate(&tools);
        assert_eq!(result.matched, vec!["Docker".to_string()]);
        assert_eq!(result.excluded, vec!["Jenkins".to_string()]);
        assert!(!result.is_fit());
    }

    #[test]
    fn process_exclusion_wins() {
        let criteria = ProcessCriteria {
            include: vec!["CI/CD".into(), "code review".into()],
            exclude: vec!["waterfall".into()],
        };
        assert_eq!(
            criteria.evaluate("We own our CI/CD pipeline"),
            Some(vec!["CI/CD".to_string()])
        );
        assert_eq!(criteria.evaluate("Strict Waterfall process, CI/CD"), None);
    }

    #[test]
    fn person_criteria_need_a_title() {
        let criteria = PersonCriteria {
            titles: vec!["engineer".into()],
            seniorities: vec!["head".into(), "vp".into()],
            departments: vec![],
        };
        assert!(criteria.matches(Some("Head of Engineering")));
        assert!(!criteria.matches(Some("Senior Engineer")));
        assert!(!criteria.matches(None));
        assert!(PersonCriteria::default().matches(None));
    }

    #[test]
    fn profile_reports_only_configured_blocks() {
        let profile = IcpProfile {
            tool: Some(ToolCriteria {
                include: vec!["Rust".into()],
                exclude: vec![],
            }),
            ..Default::default()
        };
        let rust = Tool::new("Rust", ToolCertainty::High);
        let subject = IcpSubject {
            tools: vec![&rust],
            ..Default::default()
        };
        let result = profile.evaluate(&subject);
        assert_eq!(result.company, None);
        assert_eq!(result.process_keywords, None);
        assert_eq!(result.tools.unwrap().matched, vec!["Rust".to_string()]);
    }

    #[test]
    fn profile_filters_contacts() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let profile = IcpProfile {
            person: Some(PersonCriteria {
                titles: vec!["cto".into()],
                ..Default::default()
            }),
            company: Some(CompanyCriteria::default()),
            ..Default::default()
        };
        let subject = IcpSubject {
            contacts: vec![(a, Some("CTO")), (b, Some("Recruiter"))],
            ..Default::default()
        };
        let result = profile.evaluate(&subject);
        assert_eq!(result.matching_contacts, Some(vec![a]));
        // Company block set but no company on the subject
        assert_eq!(result.company, Some(false));
    }
}
