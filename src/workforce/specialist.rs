//! Specialist definitions and the roster they are registered in.
//!
//! A [`Specialist`] is one named prompt template a task can be dispatched to.
//! The [`SpecialistRoster`] is an explicit configuration value: it is built by
//! the caller and handed to the decision parser and the orchestrator at
//! construction time, so there is no process-wide registry to mutate.

use std::error::Error;
use std::fmt;

/// How the orchestrator treats a dispatch to this specialist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialistKind {
    /// A plain prompt template: the specialist's reply text is the result.
    TextGeneration,
    /// The document-producing route: output is handed to the rendering
    /// collaborator instead of being returned as-is.
    DocumentRendering,
}

/// One named prompt template the orchestrator can dispatch a task to.
#[derive(Debug, Clone)]
pub struct Specialist {
    /// Exact name the classifier must use to select this specialist.
    pub name: String,
    /// One-line capability summary shown to the classifier.
    pub handoff_description: String,
    /// System prompt injected when this specialist is invoked.
    pub instructions: String,
    /// Dispatch behavior for this route.
    pub kind: SpecialistKind,
}

impl Specialist {
    /// Create a text-generation specialist.
    pub fn new(
        name: impl Into<String>,
        handoff_description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            handoff_description: handoff_description.into(),
            instructions: instructions.into(),
            kind: SpecialistKind::TextGeneration,
        }
    }

    /// Override the dispatch kind (builder pattern).
    pub fn with_kind(mut self, kind: SpecialistKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Error returned when registering a specialist under an already-used name.
#[derive(Debug, Clone)]
pub struct DuplicateSpecialist(pub String);

impl fmt::Display for DuplicateSpecialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specialist with name '{}' already exists", self.0)
    }
}

impl Error for DuplicateSpecialist {}

/// Insertion-ordered collection of specialists with unique names.
#[derive(Debug, Clone, Default)]
pub struct SpecialistRoster {
    specialists: Vec<Specialist>,
}

impl SpecialistRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a specialist. Names must be unique; the insertion order is
    /// preserved everywhere the roster is listed.
    pub fn add(&mut self, specialist: Specialist) -> Result<(), DuplicateSpecialist> {
        if self.contains(&specialist.name) {
            return Err(DuplicateSpecialist(specialist.name));
        }
        self.specialists.push(specialist);
        Ok(())
    }

    /// Look up a specialist by exact name.
    pub fn get(&self, name: &str) -> Option<&Specialist> {
        self.specialists.iter().find(|s| s.name == name)
    }

    /// Whether a specialist with this exact name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.specialists.iter().map(|s| s.name.as_str()).collect()
    }

    /// Iterate over the specialists in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Specialist> {
        self.specialists.iter()
    }

    /// Number of registered specialists.
    pub fn len(&self) -> usize {
        self.specialists.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.specialists.is_empty()
    }

    /// One `- Name: capability` line per specialist, for classifier prompts.
    pub fn catalog(&self) -> String {
        self.specialists
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.handoff_description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The stock roster of twelve specialists this system ships with.
    ///
    /// Callers that want a different workforce can build their own roster
    /// from [`Specialist::new`]; nothing in the crate assumes these entries.
    pub fn default_roster() -> Self {
        let mut roster = SpecialistRoster::new();

        let entries = vec![
            Specialist::new(
                "Web Scraper",
                "Extract information from websites and web pages",
                "You are a Web Scraper AI. Given a URL and what to look for, browse the \
                 content and retrieve the requested data. Focus on accuracy and relevance, \
                 report captchas or blocks instead of guessing, and return structured \
                 extractions. Use any conversation history you are given to build on \
                 successful approaches from previous tasks.",
            ),
            Specialist::new(
                "Business Environment Analyst",
                "Analyze business landscapes and environments",
                "You are a Business Environment Analyst AI. Analyze the business landscape \
                 for the sector or company in question: trends, opportunities, threats, and \
                 key players. Synthesize findings into a concise report focused on market \
                 dynamics and strategic insight. Stay consistent with analytical frameworks \
                 used in any prior conversations provided.",
            ),
            Specialist::new(
                "Market Research Analyst",
                "Conduct market research and competitive analysis",
                "You are a Market Research Analyst AI. Research the given product, service, \
                 or industry: consumer preferences, competitor activity, market size and \
                 potential. Present findings with supporting evidence, segmentation, pricing \
                 analysis, and growth projections. Build on earlier research from the \
                 conversation history where it applies.",
            ),
            Specialist::new(
                "Data Analyst",
                "Process and analyze datasets and data",
                "You are a Data Analyst AI. Process the data provided, identify patterns, \
                 correlations, and anomalies, and communicate findings with clear summaries \
                 and data-driven recommendations. State any assumptions you make. Keep \
                 techniques consistent with previous analyses in the conversation history.",
            ),
            Specialist::new(
                "Content Writer",
                "Create written content like articles, blogs, copy",
                "You are a Content Writer AI. Create engaging, well-researched content for \
                 the given topic and audience: articles, blog posts, website copy, or product \
                 descriptions. Keep tone and style appropriate and the writing original. \
                 Maintain a consistent voice with related content from past conversations.",
            ),
            Specialist::new(
                "Social Media Manager",
                "Develop social media strategies and content",
                "You are a Social Media Manager AI. Develop social media strategies: posts, \
                 content calendars, hashtag strategies, and engagement plans for the \
                 specified platforms. Your goal is brand presence and engagement. Keep \
                 messaging consistent with campaigns discussed earlier in the history.",
            ),
            Specialist::new(
                "Social Media Video Creator",
                "Create video content for social platforms",
                "You are a Social Media Video Creator AI. Conceptualize short, engaging \
                 videos for platforms like TikTok, Instagram Reels, or YouTube Shorts: \
                 produce a script, suggested visuals, and a storyboard where possible. \
                 Optimize for the platform, and reuse video concepts that worked before.",
            ),
            Specialist::new(
                "Graphic Designer",
                "Design graphics, logos, and visual materials",
                "You are a Graphic Designer AI. Describe visually appealing designs for \
                 logos, social posts, banners, or marketing materials, applying color \
                 theory, typography, and visual hierarchy. Adhere to any branding guidelines \
                 provided and stay consistent with design decisions from prior work.",
            ),
            Specialist::new(
                "Video Editor",
                "Edit and produce video content",
                "You are a Video Editor AI. Plan the edit of raw footage into a polished \
                 product: cuts, arrangement, music, overlays, and color correction, with \
                 attention to pacing and storytelling. Keep the editing style consistent \
                 with earlier projects from the conversation history.",
            ),
            Specialist::new(
                "PDF Producer",
                "Create and format PDF documents",
                "You are a document author. Write the complete, polished body text for the \
                 requested document: clear headings, well-structured paragraphs, and a \
                 professional register. Output only the document content itself, with no \
                 commentary about files or formats; rendering and saving are handled for \
                 you.",
            )
            .with_kind(SpecialistKind::DocumentRendering),
            Specialist::new(
                "PowerPoint Producer",
                "Create PowerPoint presentations",
                "You are a PowerPoint Producer AI. Design a slide deck for the provided \
                 content and objectives: slide-by-slide structure, titles, bullet content, \
                 and suggested charts or images, with attention to flow and visual \
                 consistency. Follow presentation standards established in past decks.",
            ),
            Specialist::new(
                "Pitch Deck Producer",
                "Create business pitch decks and investor presentations",
                "You are a Pitch Deck Producer AI. Develop a concise, persuasive pitch deck \
                 for the business idea at hand: problem, solution, market, business model, \
                 team, and financial projections, with investor-focused metrics and a clear \
                 value proposition. Build on storytelling that worked in earlier decks.",
            ),
        ];

        for specialist in entries {
            // Names above are distinct by construction.
            let _ = roster.add(specialist);
        }
        roster
    }
}
