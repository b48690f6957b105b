// CLI errors are handled via anyhow at the top level.

pub fn format_error(err: &anyhow::Error) -> String {
    let mut msg = format!("error: {err}");
    for cause in err.chain().skip(1) {
        msg.push_str(&format!("\n  caused by: {cause}"));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_cause_chain() {
        let err = anyhow::anyhow!("server rejected request (401): Missing auth token")
            .context("could not list goals");
        assert_eq!(
            format_error(&err),
            "error: could not list goals\n  caused by: server rejected request (401): Missing auth token"
        );
    }
}
