use std::fmt;

pub fn display_fn<F>(f: F) -> impl fmt::Display
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    struct DisplayFn<F>(F);
    impl<F> fmt::Display for DisplayFn<F>
    where
        F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
    {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.0)(formatter)
        }
    }
    DisplayFn(f)
}

/// Render a sequence of displayable values separated by `sep`.
pub fn join<'a, I, T>(items: I, sep: &'a str) -> impl fmt::Display + 'a
where
    I: IntoIterator<Item = T> + Clone + 'a,
    T: fmt::Display + 'a,
{
    display_fn(move |f| {
        for (i, item) in items.clone().into_iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    })
}

/// Drop every line whose first non-blank characters are `//`.
///
/// Line numbering is preserved: a removed line leaves an empty line behind,
/// so diagnostics still point into the original file.
pub fn strip_comment_lines(source: &str) -> String {
    let mut stripped = String::with_capacity(source.len());
    for line in source.lines() {
        if !line.trim_start().starts_with("//") {
            stripped.push_str(line);
        }
        stripped.push('\n');
    }
    stripped
}
