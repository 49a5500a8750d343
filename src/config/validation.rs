use regex::Regex;

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are left as written.
pub fn expand_vars_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let re = match Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return value.to_string(),
    };

    re.replace_all(value, |caps: &regex::Captures| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
