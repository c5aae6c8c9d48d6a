use crate::processor::MediaType;

pub fn text_prompt(
    instructions: &str,
    original_name: &str,
    media_type: &MediaType,
    text: &str,
) -> String {
    format!(
        "Instructions from user: {instructions}\n\n\
         Document content (from {original_name}, type: {media_type}):\n\n\
         {text}\n\n\
         Process the above document content according to the user's instructions.\n\
         Format your response in markdown."
    )
}

pub fn image_prompt(instructions: &str) -> String {
    format!(
        "Instructions: {instructions}\n\n\
         Analyze this image and respond according to the instructions."
    )
}
