use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! language_codes {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        /// Languages Polly can describe voices for.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum LanguageCode {
            $($variant),+
        }

        impl LanguageCode {
            /// Every supported code, in the order the language selector lists them.
            pub const ALL: &'static [LanguageCode] = &[$(LanguageCode::$variant),+];

            /// Provider spelling, e.g. `en-US`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(LanguageCode::$variant => $code),+
                }
            }
        }
    };
}

language_codes! {
    Arb => "arb",
    ArAe => "ar-AE",
    CaEs => "ca-ES",
    CmnCn => "cmn-CN",
    CsCz => "cs-CZ",
    CyGb => "cy-GB",
    DaDk => "da-DK",
    DeAt => "de-AT",
    DeCh => "de-CH",
    DeDe => "de-DE",
    EnAu => "en-AU",
    EnGb => "en-GB",
    EnGbWls => "en-GB-WLS",
    EnIe => "en-IE",
    EnIn => "en-IN",
    EnNz => "en-NZ",
    EnSg => "en-SG",
    EnUs => "en-US",
    EnZa => "en-ZA",
    EsEs => "es-ES",
    EsMx => "es-MX",
    EsUs => "es-US",
    FiFi => "fi-FI",
    FrBe => "fr-BE",
    FrCa => "fr-CA",
    FrFr => "fr-FR",
    HiIn => "hi-IN",
    IsIs => "is-IS",
    ItIt => "it-IT",
    JaJp => "ja-JP",
    KoKr => "ko-KR",
    NbNo => "nb-NO",
    NlBe => "nl-BE",
    NlNl => "nl-NL",
    PlPl => "pl-PL",
    PtBr => "pt-BR",
    PtPt => "pt-PT",
    RoRo => "ro-RO",
    RuRu => "ru-RU",
    SvSe => "sv-SE",
    TrTr => "tr-TR",
    YueCn => "yue-CN",
}

impl FromStr for LanguageCode {
    type Err = StudioError;

    /// Accepts `en-US` as well as the underscore spelling `en_US`.
    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-");
        LanguageCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| StudioError::UnknownLanguage(s.to_string()))
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        LanguageCode::EnUs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_spellings() {
        assert_eq!("en-US".parse::<LanguageCode>().unwrap(), LanguageCode::EnUs);
        assert_eq!("en_US".parse::<LanguageCode>().unwrap(), LanguageCode::EnUs);
        assert_eq!("fr_fr".parse::<LanguageCode>().unwrap(), LanguageCode::FrFr);
        assert_eq!(
            "en_GB_WLS".parse::<LanguageCode>().unwrap(),
            LanguageCode::EnGbWls
        );
    }

    #[test]
    fn test_unknown_code_rejected() {
        let err = "xx-YY".parse::<LanguageCode>().unwrap_err();
        assert!(matches!(err, StudioError::UnknownLanguage(code) if code == "xx-YY"));
    }

    #[test]
    fn test_every_code_parses_back() {
        for code in LanguageCode::ALL {
            assert_eq!(code.as_str().parse::<LanguageCode>().unwrap(), *code);
        }
    }

    #[test]
    fn test_serde_uses_provider_spelling() {
        let json = serde_json::to_string(&LanguageCode::PtBr).unwrap();
        assert_eq!(json, "\"pt-BR\"");
        let back: LanguageCode = serde_json::from_str("\"pt_BR\"").unwrap();
        assert_eq!(back, LanguageCode::PtBr);
    }
}
