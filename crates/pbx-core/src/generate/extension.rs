use pbx_config::Section;
use pbx_model::Extension;

use super::{join_sections, yes_no};

/// Endpoint, auth and aor sections for one extension.
///
/// `password` is the plaintext secret. When it is `None` the auth section is
/// still emitted, without a password line.
pub fn render_extension(ext: &Extension, password: Option<&str>) -> String {
    let number = ext.number.as_str();

    let mut endpoint = Section::new(number)
        .with("type", "endpoint")
        .with("context", &ext.context)
        .with("disallow", "all");
    for codec in ext.codecs.iter() {
        endpoint.push("allow", codec);
    }
    endpoint.push("transport", ext.transport.section_name());
    endpoint.push("auth", format!("{}-auth", number));
    endpoint.push("aors", format!("{}-aor", number));
    endpoint.push("callerid", format!("\"{}\" <{}>", ext.name.replace('"', "'"), number));
    endpoint.push("direct_media", yes_no(ext.direct_media));

    let mut auth = Section::new(format!("{}-auth", number))
        .with("type", "auth")
        .with("auth_type", "userpass")
        .with("username", number);
    if let Some(password) = password {
        auth.push("password", password);
    }

    let aor = Section::new(format!("{}-aor", number))
        .with("type", "aor")
        .with("max_contacts", ext.max_contacts.to_string())
        .with("qualify_frequency", ext.qualify_frequency.to_string());

    join_sections(&[endpoint, auth, aor])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbx_model::{CodecList, Transport};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_with_defaults() {
        let ext = Extension::new("1001", "Ann");
        let text = render_extension(&ext, Some("s3cretpass"));

        assert_eq!(
            text,
            "[1001]\n\
             type=endpoint\n\
             context=from-internal\n\
             disallow=all\n\
             allow=ulaw\n\
             allow=alaw\n\
             allow=g722\n\
             transport=transport-udp\n\
             auth=1001-auth\n\
             aors=1001-aor\n\
             callerid=\"Ann\" <1001>\n\
             direct_media=no\n\
             \n\
             [1001-auth]\n\
             type=auth\n\
             auth_type=userpass\n\
             username=1001\n\
             password=s3cretpass\n\
             \n\
             [1001-aor]\n\
             type=aor\n\
             max_contacts=1\n\
             qualify_frequency=60\n"
        );
    }

    #[test]
    fn test_render_without_password_omits_line() {
        let text = render_extension(&Extension::new("1001", "Ann"), None);
        assert!(text.contains("[1001-auth]\ntype=auth\nauth_type=userpass\nusername=1001\n\n"));
        assert!(!text.contains("password="));
    }

    #[test]
    fn test_render_non_default_fields() {
        let mut ext = Extension::new("2002", "Bob \"B\"").with_context("sales");
        ext.transport = Transport::Tls;
        ext.codecs = CodecList::new(["opus", "ulaw"]);
        ext.max_contacts = 3;
        ext.direct_media = true;

        let text = render_extension(&ext, None);

        assert!(text.contains("context=sales\n"));
        assert!(text.contains("disallow=all\nallow=opus\nallow=ulaw\ntransport=transport-tls\n"));
        assert!(text.contains("callerid=\"Bob 'B'\" <2002>\n"));
        assert!(text.contains("direct_media=yes\n"));
        assert!(text.contains("max_contacts=3\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let ext = Extension::new("1001", "Ann");
        assert_eq!(render_extension(&ext, Some("pw123456")), render_extension(&ext, Some("pw123456")));
    }
}
