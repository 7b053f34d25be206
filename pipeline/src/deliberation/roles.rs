//! The fixed deliberation roster and each role's standing instructions.

/// A conversational participant with a fixed responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Opens the conversation with the task statement and keeps the floor
    /// moving; contributes no domain content of its own.
    Coordinator,
    /// Emits the explicit, objectively verifiable claims found in the text.
    ClaimExtractor,
    /// Gathers evidence for each claim via the injected search capability.
    EvidenceGatherer,
    /// Scores each claim and emits the final structured report.
    VerdictGenerator,
}

/// Strict speaking order, repeated round after round.
pub const ROSTER: [Role; 4] = [
    Role::Coordinator,
    Role::ClaimExtractor,
    Role::EvidenceGatherer,
    Role::VerdictGenerator,
];

impl Role {
    /// The role's reasoner-facing description. The Coordinator never reaches
    /// a reasoner, so its entry exists only for labeling.
    pub fn spec(self) -> &'static RoleSpec {
        match self {
            Self::Coordinator => &COORDINATOR,
            Self::ClaimExtractor => &CLAIM_EXTRACTOR,
            Self::EvidenceGatherer => &EVIDENCE_GATHERER,
            Self::VerdictGenerator => &VERDICT_GENERATOR,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spec().name)
    }
}

/// Name and standing system message for one role.
#[derive(Debug)]
pub struct RoleSpec {
    pub name: &'static str,
    pub system_message: &'static str,
}

static COORDINATOR: RoleSpec = RoleSpec {
    name: "Coordinator",
    system_message: "A moderator. Interact with the team to verify the claims.",
};

static CLAIM_EXTRACTOR: RoleSpec = RoleSpec {
    name: "Claim_Extractor",
    system_message: "Your role is to analyze the provided text and identify all \
        explicit factual claims. Focus on statements that can be objectively \
        verified. Distinguish facts from opinions. Output a JSON array of \
        strings, where each string is a claim.",
};

static EVIDENCE_GATHERER: RoleSpec = RoleSpec {
    name: "Evidence_Gatherer",
    system_message: "You are an expert researcher. Your role is to take the \
        claims identified by the Claim_Extractor and find evidence from \
        reliable sources using the search results provided to you. For each \
        claim, provide a summary of the evidence you find.",
};

static VERDICT_GENERATOR: RoleSpec = RoleSpec {
    name: "Verdict_Generator",
    system_message: "Your role is to analyze the claims and the evidence \
        provided by the Evidence_Gatherer. For each claim, determine its \
        veracity and assign a reliability score from 0-100. Then, compile a \
        final report. Your final output must be a single JSON object of the \
        shape {\"claims\": [{\"claim\": \"...\", \"evidence_summary\": \"...\", \
        \"score\": 0-100}], \"report\": \"...\", \"overall_score\": 0-100}. \
        Provide ONLY the raw JSON output without any Markdown formatting or \
        additional text.",
};

/// Opening task statement for round one.
pub fn opening_statement(text: &str) -> String {
    format!(
        "Please analyze the following text, verify the claims, and provide a \
         final report in the specified JSON format:\n\n{text}"
    )
}

/// Neutral floor-keeping prompt for later Coordinator turns.
pub const CONTINUATION_PROMPT: &str = "Please continue.";
