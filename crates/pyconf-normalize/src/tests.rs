use std::borrow::Cow;
use std::str::FromStr;

use insta::assert_snapshot;

use super::*;

#[test]
fn separators_and_case() {
    for input in [
        "Friendly-Bard",
        "FRIENDLY-BARD",
        "friendly.bard",
        "friendly_bard",
        "friendly--bard",
        "friendly-.bard",
        "FrIeNdLy-._.-bArD",
    ] {
        let normalized = normalize(input).unwrap();
        assert_eq!(normalized, "friendly-bard", "{input}");
        assert!(matches!(normalized, Cow::Owned(_)), "{input}");
    }
}

#[test]
fn already_normalized() {
    for input in ["friendly-bard", "friendlybard", "1okay", "okay2", "a"] {
        assert!(matches!(normalize(input).unwrap(), Cow::Borrowed(name) if name == input));
    }
}

#[test]
fn invalid() {
    for input in [
        "",
        " starts-with-space",
        "-starts-with-dash",
        "_starts-with-underscore",
        "ends-with-dash-",
        "ends-with-dot.",
        "ends-with-space ",
        "includes!invalid-char",
        "space in middle",
        "alpha-α",
    ] {
        let err = normalize(input).unwrap_err();
        assert_eq!(err.as_str(), input);
    }

    assert_snapshot!(
        PackageName::from_str("hello world").unwrap_err(),
        @"`hello world` is not a valid name: names must start and end with an ASCII letter or digit, and may only contain ASCII letters, digits, `-`, `_` and `.`"
    );
}

#[test]
fn package_name() {
    let name = PackageName::from_str("Friendly.Bard_Core").unwrap();
    assert_eq!(name.as_str(), "friendly-bard-core");
    assert_eq!(name.to_string(), "friendly-bard-core");
}

#[test]
fn extra_names_compare_normalized() {
    assert_eq!(
        ExtraName::from_str("Dev_Tools").unwrap(),
        ExtraName::from_str("dev.tools").unwrap()
    );
}
