use cv_core::FEATURE_COLUMNS;

pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are an AI that extracts numeric features (0-1) from civic reports.";

pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are CiviSmart AI assistant. Answer volunteer questions about civic reports, tasks, points, and urgency clearly and concisely.";

/// User prompt asking for the eight scores as a JSON object.
pub fn feature_prompt(report_text: &str) -> String {
    let columns: String = FEATURE_COLUMNS.iter().map(|c| format!("- {c}\n")).collect();
    format!(
        "You are an AI assistant that reads civic reports and extracts numeric scores (0-1) for each of the following features:\n\
         {columns}\n\
         Report:\n\
         {report_text}\n\n\
         Return the result as a JSON dictionary with each feature as a key and a value between 0 and 1."
    )
}
