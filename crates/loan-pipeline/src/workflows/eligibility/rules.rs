use super::{ScoreComponent, ScoreFactor};

pub(crate) const UNIVERSITY_MAX_POINTS: u8 = 40;
pub(crate) const SALARY_MAX_POINTS: u8 = 35;
/// Quick checks assume a parent co-applicant; relationship is not collected yet.
pub(crate) const ASSUMED_RELATIONSHIP_POINTS: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UniversityGrade {
    A,
    B,
    C,
    D,
}

impl UniversityGrade {
    pub(crate) fn from_score(score: Option<u8>) -> Self {
        match score {
            Some(score) if score >= 90 => Self::A,
            Some(score) if score >= 70 => Self::B,
            Some(score) if score >= 50 => Self::C,
            Some(_) => Self::D,
            None => Self::C,
        }
    }

    const fn points(self) -> u8 {
        match self {
            Self::A => 40,
            Self::B => 32,
            Self::C => 25,
            Self::D => 18,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::A => "Grade A",
            Self::B => "Grade B",
            Self::C => "Grade C",
            Self::D => "Grade D",
        }
    }
}

pub(crate) fn university_component(score: Option<u8>) -> ScoreComponent {
    let grade = UniversityGrade::from_score(score);
    let band = match score {
        Some(_) => grade.label().to_string(),
        None => format!("{} (no university data)", grade.label()),
    };

    ScoreComponent {
        factor: ScoreFactor::University,
        points: grade.points(),
        max_points: UNIVERSITY_MAX_POINTS,
        band,
    }
}

pub(crate) fn salary_component(monthly_salary: u64) -> ScoreComponent {
    let (points, band) = match monthly_salary {
        salary if salary >= 100_000 => (35, "Above 1L"),
        salary if salary >= 75_000 => (28, "75K-1L"),
        salary if salary >= 50_000 => (20, "50K-75K"),
        _ => (12, "Below 50K"),
    };

    ScoreComponent {
        factor: ScoreFactor::CoApplicantSalary,
        points,
        max_points: SALARY_MAX_POINTS,
        band: band.to_string(),
    }
}

pub(crate) fn relationship_component() -> ScoreComponent {
    ScoreComponent {
        factor: ScoreFactor::Relationship,
        points: ASSUMED_RELATIONSHIP_POINTS,
        max_points: ASSUMED_RELATIONSHIP_POINTS,
        band: "Parent (assumed)".to_string(),
    }
}

pub(crate) fn total(components: &[ScoreComponent]) -> u8 {
    let sum: u32 = components.iter().map(|c| u32::from(c.points)).sum();
    sum.min(100) as u8
}
