use rmp_types::{ProfessorRecord, RatingRecord};

/// System prompt - instructs the LLM how to behave
pub const SYSTEM_PROMPT: &str = "You are an assistant designed to help users get information on their professors at the University of Ottawa. \
The following is information on a particular professor. \
Answer any questions that a user may have about this professor.\n\n\
If a user asks where the data came from, or for this professor's page, you should provide the full `siteUrl` key.";

pub const SITE_NAME: &str = "Rate My Professors";

/// Course the user is looking at when asking.
#[derive(Debug, Clone)]
pub struct CourseContext<'a> {
    pub code: &'a str,
    pub display_name: &'a str,
}

/// Format a professor's profile and feedback as the XML context block.
pub fn build_context(id: &str, info: &ProfessorRecord, course: &CourseContext<'_>) -> String {
    // Undecodable id: leave the link empty.
    let source_url = rmp_types::profile_url(id).unwrap_or_else(|e| {
        tracing::warn!(id, error = %e, "cannot derive profile url");
        String::new()
    });

    let would_take_again = info
        .would_take_again()
        .map(|p| format!("{p:.2}"))
        .unwrap_or_else(|| "N/A".into());

    let feedback: Vec<String> = info.ratings.iter().map(format_feedback).collect();

    format!(
        "<dataSourceSection>\n\
<siteName>{SITE_NAME}</siteName>\n\
<siteUrl>{source_url}</siteUrl>\n\
</dataSourceSection>\n\
<professorDetailsSection>\n\
<professorName>{name}</professorName>\n\
<avgRating>{avg_rating}</avgRating>\n\
<avgDifficulty>{avg_difficulty}</avgDifficulty>\n\
<wouldTakeAgainPercent>{would_take_again}</wouldTakeAgainPercent>\n\
</professorDetailsSection>\n\
<courseDetailsSection>\n\
<courseCode>{code}</courseCode>\n\
<courseDisplayName>{display}</courseDisplayName>\n\
</courseDetailsSection>\n\
<userFeedbackSection>\n\
{feedback}\n\
</userFeedbackSection>",
        name = escape(&info.full_name()),
        avg_rating = info.avg_rating,
        avg_difficulty = info.avg_difficulty,
        code = escape(course.code),
        display = escape(course.display_name),
        feedback = feedback.join("\n"),
    )
}

fn format_feedback(rating: &RatingRecord) -> String {
    format!(
        "<userFeedback>\n\
<clarityRating>{}/5.0</clarityRating>\n\
<difficultyRating>{}/5.0</difficultyRating>\n\
<helpfulRating>{}/5.0</helpfulRating>\n\
<comment>{}</comment>\n\
</userFeedback>",
        rating.clarity_rating,
        rating.difficulty_rating,
        rating.helpful_rating,
        escape(&rating.comment)
    )
}

/// What the agent is given for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptParts {
    /// Agent instructions
    pub preamble: &'static str,
    /// Professor context document
    pub context: String,
    /// The user's question
    pub prompt: String,
}

/// Build the agent input: instructions, context, question.
pub fn build_prompt(
    id: &str,
    info: &ProfessorRecord,
    course: &CourseContext<'_>,
    prompt: &str,
) -> PromptParts {
    PromptParts {
        preamble: SYSTEM_PROMPT,
        context: build_context(id, info, course),
        prompt: prompt.to_owned(),
    }
}

/// Keep user-written text from opening or closing context tags.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
