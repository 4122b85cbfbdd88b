pub const STRATEGY: &str = include_str!("../data/prompts/strategy.txt");
pub const THUMBNAIL: &str = include_str!("../data/prompts/thumbnail.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substituted values are never rescanned, so a value containing `{{...}}`
/// is inserted literally.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        let key = &after_open[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => {
                result.push_str("{{");
                result.push_str(key);
                result.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

pub fn strategy_prompt(topic: &str) -> String {
    render(STRATEGY, &[("topic", topic)]).trim_end().to_string()
}

/// Overlay text is not part of the prompt; the view draws it over the image.
pub fn thumbnail_prompt(idea: &str, emotion: &str) -> String {
    render(THUMBNAIL, &[("idea", idea), ("emotion", emotion)])
        .trim_end()
        .to_string()
}
