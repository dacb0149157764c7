/// Substitutes `{name}` placeholders in a single pass.
///
/// Values are inserted verbatim and never rescanned, so text coming from
/// retrieved context or restrictions can't inject further placeholders.
/// Placeholders without a matching variable are kept as written.
pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some(end) = after.find('}') else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };

        let name = &after[..end];
        if name.contains('{') {
            // "{{x}" style input, the inner brace may still open a placeholder
            rendered.push('{');
            rest = after;
            continue;
        }

        match variables.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => rendered.push_str(value),
            None => {
                rendered.push('{');
                rendered.push_str(name);
                rendered.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    rendered.push_str(rest);
    rendered
}

/// Renders items as `"{i} - {item}\n"` lines, numbered from 1.
pub fn numbered_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{} - {}\n", i + 1, item.as_ref()))
        .collect()
}
