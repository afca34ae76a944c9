use crate::domain::model::Employee;

/// Title keywords that mark an employee as a decision maker.
const DECISION_MAKER_TITLES: &[&str] = &[
    "CEO",
    "Chief",
    "President",
    "Director",
    "VP",
    "Vice President",
    "Head of",
    "Manager",
    "Founder",
    "Owner",
    "Partner",
    "Executive",
];

/// Case-insensitive substring match of employee titles against a keyword
/// set. Records without a title never match.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    keywords: Vec<String>,
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self::new(DECISION_MAKER_TITLES)
    }
}

impl TitleFilter {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn is_decision_maker(&self, employee: &Employee) -> bool {
        match employee.title() {
            Some(title) => {
                let title = title.to_lowercase();
                self.keywords.iter().any(|keyword| title.contains(keyword))
            }
            None => false,
        }
    }
}
