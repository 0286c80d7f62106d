use crate::dispatch::EmergencyType;

/// Localized strings attached to outgoing notifications.
#[derive(Debug, Clone)]
pub struct LanguageStrings {
    /// Language code these strings belong to
    pub code: &'static str,

    /// Label placed in front of urgent notifications (e.g., "EMERGENCY")
    pub emergency_label: &'static str,

    /// Notice shown when the translation failed and the original text is delivered
    pub translation_failure_notice: &'static str,

    /// Labels for medical emergency, natural disaster, safety alert and police assistance
    pub emergency_types: [&'static str; 4],
}

impl LanguageStrings {
    /// Strings for a language code, falling back to English.
    pub fn for_code(code: &str) -> &'static LanguageStrings {
        STRINGS
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code))
            .unwrap_or(&STRINGS[0])
    }

    /// Localized label of an emergency category.
    pub fn emergency_type_label(&self, emergency_type: EmergencyType) -> &'static str {
        let index = match emergency_type {
            EmergencyType::MedicalEmergency => 0,
            EmergencyType::NaturalDisaster => 1,
            EmergencyType::SafetyAlert => 2,
            EmergencyType::PoliceAssistance => 3,
        };
        self.emergency_types[index]
    }

    /// Render an urgent notification: `[HI] आपातकाल: TEXT`, or with a category
    /// `[HI] आपातकाल (प्राकृतिक आपदा): TEXT`.
    pub fn format_emergency(&self, text: &str, emergency_type: Option<EmergencyType>) -> String {
        match emergency_type {
            Some(kind) => format!(
                "[{}] {} ({}): {}",
                self.code.to_uppercase(),
                self.emergency_label,
                self.emergency_type_label(kind),
                text.to_uppercase()
            ),
            None => format!(
                "[{}] {}: {}",
                self.code.to_uppercase(),
                self.emergency_label,
                text.to_uppercase()
            ),
        }
    }

    /// Render the fallback delivered when translation failed.
    pub fn format_fallback(&self, original: &str) -> String {
        format!("{}\n\n{}", self.translation_failure_notice, original)
    }
}

static STRINGS: [LanguageStrings; 10] = [
    LanguageStrings {
        code: "en",
        emergency_label: "EMERGENCY",
        translation_failure_notice: "Translation unavailable. Showing the original message.",
        emergency_types: [
            "Medical Emergency",
            "Natural Disaster",
            "Safety Alert",
            "Police Assistance",
        ],
    },
    LanguageStrings {
        code: "hi",
        emergency_label: "आपातकाल",
        translation_failure_notice: "अनुवाद उपलब्ध नहीं है। मूल संदेश दिखाया जा रहा है।",
        emergency_types: [
            "चिकित्सा आपातकाल",
            "प्राकृतिक आपदा",
            "सुरक्षा चेतावनी",
            "पुलिस सहायता",
        ],
    },
    LanguageStrings {
        code: "mr",
        emergency_label: "आणीबाणी",
        translation_failure_notice: "भाषांतर उपलब्ध नाही. मूळ संदेश दाखवत आहे.",
        emergency_types: [
            "वैद्यकीय आणीबाणी",
            "नैसर्गिक आपत्ती",
            "सुरक्षा इशारा",
            "पोलीस मदत",
        ],
    },
    LanguageStrings {
        code: "ta",
        emergency_label: "அவசரநிலை",
        translation_failure_notice: "மொழிபெயர்ப்பு கிடைக்கவில்லை. அசல் செய்தி காட்டப்படுகிறது.",
        emergency_types: [
            "மருத்துவ அவசரநிலை",
            "இயற்கை பேரிடர்",
            "பாதுகாப்பு எச்சரிக்கை",
            "காவல்துறை உதவி",
        ],
    },
    LanguageStrings {
        code: "te",
        emergency_label: "అత్యవసరం",
        translation_failure_notice: "అనువాదం అందుబాటులో లేదు. అసలు సందేశం చూపబడుతోంది.",
        emergency_types: [
            "వైద్య అత్యవసర పరిస్థితి",
            "ప్రకృతి వైపరీత్యం",
            "భద్రతా హెచ్చరిక",
            "పోలీసు సహాయం",
        ],
    },
    LanguageStrings {
        code: "kn",
        emergency_label: "ತುರ್ತು",
        translation_failure_notice: "ಅನುವಾದ ಲಭ್ಯವಿಲ್ಲ. ಮೂಲ ಸಂದೇಶವನ್ನು ತೋರಿಸಲಾಗುತ್ತಿದೆ.",
        emergency_types: [
            "ವೈದ್ಯಕೀಯ ತುರ್ತುಸ್ಥಿತಿ",
            "ನೈಸರ್ಗಿಕ ವಿಕೋಪ",
            "ಸುರಕ್ಷತಾ ಎಚ್ಚರಿಕೆ",
            "ಪೊಲೀಸ್ ಸಹಾಯ",
        ],
    },
    LanguageStrings {
        code: "ml",
        emergency_label: "അടിയന്തരാവസ്ഥ",
        translation_failure_notice: "വിവർത്തനം ലഭ്യമല്ല. യഥാർത്ഥ സന്ദേശം കാണിക്കുന്നു.",
        emergency_types: [
            "മെഡിക്കൽ അടിയന്തരാവസ്ഥ",
            "പ്രകൃതി ദുരന്തം",
            "സുരക്ഷാ മുന്നറിയിപ്പ്",
            "പോലീസ് സഹായം",
        ],
    },
    LanguageStrings {
        code: "gu",
        emergency_label: "કટોકટી",
        translation_failure_notice: "અનુવાદ ઉપલબ્ધ નથી. મૂળ સંદેશ બતાવવામાં આવી રહ્યો છે.",
        emergency_types: [
            "તબીબી કટોકટી",
            "કુદરતી આપત્તિ",
            "સુરક્ષા ચેતવણી",
            "પોલીસ સહાય",
        ],
    },
    LanguageStrings {
        code: "pa",
        emergency_label: "ਐਮਰਜੈਂਸੀ",
        translation_failure_notice: "ਅਨੁਵਾਦ ਉਪਲਬਧ ਨਹੀਂ ਹੈ। ਮੂਲ ਸੁਨੇਹਾ ਦਿਖਾਇਆ ਜਾ ਰਿਹਾ ਹੈ।",
        emergency_types: [
            "ਡਾਕਟਰੀ ਐਮਰਜੈਂਸੀ",
            "ਕੁਦਰਤੀ ਆਫ਼ਤ",
            "ਸੁਰੱਖਿਆ ਚੇਤਾਵਨੀ",
            "ਪੁਲਿਸ ਸਹਾਇਤਾ",
        ],
    },
    LanguageStrings {
        code: "bn",
        emergency_label: "জরুরি অবস্থা",
        translation_failure_notice: "অনুবাদ উপলব্ধ নয়। মূল বার্তা দেখানো হচ্ছে।",
        emergency_types: [
            "চিকিৎসা জরুরি অবস্থা",
            "প্রাকৃতিক দুর্যোগ",
            "নিরাপত্তা সতর্কতা",
            "পুলিশ সহায়তা",
        ],
    },
];
