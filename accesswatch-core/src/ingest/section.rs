use crate::ingest::error::SectionError;

/// Returns the section of a request target: everything before the second `/`
/// of its path. The section of `/pages/create` is `/pages`.
///
/// Query string and fragment are ignored. Absolute-form targets
/// (`http://host/pages/create`) are reduced to their path first.
pub fn section_of(resource: &str) -> Result<String, SectionError> {
    let path = strip_origin(resource);
    let path = path.split(['?', '#']).next().unwrap_or_default();

    if path.is_empty() {
        return Err(SectionError::Empty);
    }
    if !path.starts_with('/') {
        return Err(SectionError::Relative {
            path: path.to_string(),
        });
    }

    let first = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();

    Ok(format!("/{first}"))
}

fn strip_origin(resource: &str) -> &str {
    let Some(rest) = resource
        .strip_prefix("http://")
        .or_else(|| resource.strip_prefix("https://"))
    else {
        return resource;
    };

    match rest.find('/') {
        Some(i) => &rest[i..],
        None => "/",
    }
}
