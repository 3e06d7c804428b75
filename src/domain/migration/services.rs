use crate::config::RepositorySettings;

/// Render the deb source line for the target channel.
pub fn render_sources(repo: &RepositorySettings) -> String {
    format!(
        "# Managed by distiller-migrate ({} -> {})\ndeb [arch={} signed-by={}] {} {} {}\n",
        repo.previous_channel,
        repo.target_channel,
        repo.architecture,
        repo.keyring.display(),
        repo.url.trim_end_matches('/'),
        repo.target_channel,
        repo.components,
    )
}

/// Suite of the first `deb` entry in a one-line-style sources file.
pub fn sources_channel(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "deb" {
            return None;
        }

        // [arch=... signed-by=...] then the URI
        let mut token = tokens.next()?;
        if token.starts_with('[') {
            while !token.ends_with(']') {
                token = tokens.next()?;
            }
            tokens.next()?;
        }

        tokens.next().map(str::to_string)
    })
}
