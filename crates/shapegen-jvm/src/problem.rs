use shapegen_core::problem::{ProblemField, ProblemLibrary};

/// Runtime libraries generated JVM problem types can extend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JvmProblemLibrary {
    #[default]
    Quarkus,
    Sunday,
    Zalando,
}

static ZALANDO: ProblemLibrary = ProblemLibrary {
    name: "zalando",
    supertype: "org.zalando.problem.AbstractThrowableProblem",
    mapping: &[
        (ProblemField::Type, "type"),
        (ProblemField::Title, "title"),
        (ProblemField::Status, "status"),
        (ProblemField::Detail, "detail"),
        (ProblemField::Instance, "instance"),
    ],
};

static QUARKUS: ProblemLibrary = ProblemLibrary {
    name: "quarkus",
    supertype: "io.quarkiverse.resteasy.problem.HttpProblem",
    mapping: &[
        (ProblemField::Type, "withType"),
        (ProblemField::Title, "withTitle"),
        (ProblemField::Status, "withStatus"),
        (ProblemField::Detail, "withDetail"),
        (ProblemField::Instance, "withInstance"),
    ],
};

/// Sunday's own problem type takes every field through its constructor.
static SUNDAY: ProblemLibrary = ProblemLibrary {
    name: "sunday",
    supertype: "io.outfoxx.sunday.problems.SundayHttpProblem",
    mapping: &[
        (ProblemField::Type, "super(type)"),
        (ProblemField::Title, "super(title)"),
        (ProblemField::Status, "super(status)"),
        (ProblemField::Detail, "super(detail)"),
        (ProblemField::Instance, "super(instance)"),
    ],
};

impl JvmProblemLibrary {
    pub const ALL: [JvmProblemLibrary; 3] = [Self::Quarkus, Self::Sunday, Self::Zalando];

    pub fn id(self) -> &'static str {
        self.library().name
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|library| library.id() == id)
    }

    pub fn library(self) -> &'static ProblemLibrary {
        match self {
            Self::Quarkus => &QUARKUS,
            Self::Sunday => &SUNDAY,
            Self::Zalando => &ZALANDO,
        }
    }
}
