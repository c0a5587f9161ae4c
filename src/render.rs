use poem_types::{Poem, StrainLine, Strains, display_value};

/// Render a poem as a Markdown fragment.
///
/// Every line ends in a single `\n`; the caller separates fragments.
/// With `include_counts` the character and line totals are appended.
pub fn render_markdown(poem: &Poem, include_counts: bool) -> String {
    let mut out = format!(
        "# {}\n**作者**\n{}\n**朝代**\n{}\n**内容**\n",
        poem.title,
        poem.author,
        poem.dynasty.as_chinese()
    );
    for paragraph in &poem.paragraphs {
        out.push_str(paragraph);
        out.push('\n');
    }
    out.push_str("**声韵**\n");
    for line in strain_lines(&poem.strains) {
        out.push_str(&line);
        out.push('\n');
    }

    if include_counts {
        let chars: usize = poem.paragraphs.iter().map(|p| p.chars().count()).sum();
        out.push_str(&format!(
            "\n**字数**：\n{chars}\n\n**句数**：\n{}\n",
            poem.paragraphs.len()
        ));
    }

    out
}

/// One text line per strains entry: "line: pattern" for pairs, the value
/// itself otherwise. Non-list data yields nothing.
fn strain_lines(strains: &Strains) -> Vec<String> {
    let Strains::Lines(lines) = strains else {
        return Vec::new();
    };
    lines
        .iter()
        .map(|line| match line {
            StrainLine::Pair { line, strains } => {
                let text = line.as_ref().map(display_value).unwrap_or_default();
                let pattern = strains.as_ref().map(display_value).unwrap_or_default();
                format!("{text}: {pattern}")
            }
            StrainLine::Raw(value) => display_value(value),
        })
        .collect()
}
