//! Symptom → department knowledge base.
//!
//! Keywords are the Chinese terms patients actually type plus English
//! equivalents. Department names are kept in their canonical Chinese form;
//! [`department_label`] gives the English label for rendering.

/// Department every emergency is routed to.
pub const EMERGENCY_DEPARTMENT: &str = "急诊科";

/// Department used when no collected symptom is in the table.
pub const GENERAL_DEPARTMENT: &str = "内科";

// ═══════════════════════════════════════════
// Static tables
// ═══════════════════════════════════════════

static SYMPTOM_DEPARTMENTS: &[(&str, &[&str])] = &[
    // Chinese
    ("头痛", &["神经内科", "内科"]),
    ("剧烈头痛", &["神经内科", "急诊科"]),
    ("头晕", &["神经内科", "心内科"]),
    ("突发头晕", &["神经内科", "心内科"]),
    ("发烧", &["内科", "感染科"]),
    ("发热", &["内科", "感染科"]),
    ("持续发热", &["感染科", "内科"]),
    ("咳嗽", &["呼吸内科"]),
    ("咳痰", &["呼吸内科"]),
    ("喉咙痛", &["耳鼻喉科"]),
    ("咽痛", &["耳鼻喉科"]),
    ("耳鸣", &["耳鼻喉科"]),
    ("胸痛", &["心内科", "胸外科"]),
    ("胸闷", &["心内科", "呼吸内科"]),
    ("心悸", &["心内科"]),
    ("呼吸困难", &["呼吸内科", "急诊科"]),
    ("腹痛", &["消化内科", "普外科"]),
    ("肚子痛", &["消化内科", "普外科"]),
    ("剧烈腹痛", &["普外科", "消化内科"]),
    ("胃痛", &["消化内科"]),
    ("腹泻", &["消化内科"]),
    ("恶心", &["消化内科"]),
    ("呕吐", &["消化内科"]),
    ("便秘", &["消化内科"]),
    ("皮疹", &["皮肤科"]),
    ("瘙痒", &["皮肤科"]),
    ("关节痛", &["骨科", "风湿免疫科"]),
    ("腰痛", &["骨科"]),
    ("背痛", &["骨科"]),
    ("尿频", &["泌尿外科"]),
    ("尿痛", &["泌尿外科"]),
    ("失眠", &["精神心理科", "神经内科"]),
    ("焦虑", &["精神心理科"]),
    ("牙痛", &["口腔科"]),
    ("视力模糊", &["眼科"]),
    ("乏力", &["内科"]),
    ("月经不调", &["妇科"]),
    ("昏迷", &["急诊科"]),
    ("抽搐", &["神经内科", "急诊科"]),
    ("大出血", &["急诊科"]),
    // English
    ("headache", &["神经内科", "内科"]),
    ("severe headache", &["神经内科", "急诊科"]),
    ("dizziness", &["神经内科", "心内科"]),
    ("dizzy", &["神经内科", "心内科"]),
    ("sudden dizziness", &["神经内科", "心内科"]),
    ("fever", &["内科", "感染科"]),
    ("persistent fever", &["感染科", "内科"]),
    ("cough", &["呼吸内科"]),
    ("sore throat", &["耳鼻喉科"]),
    ("tinnitus", &["耳鼻喉科"]),
    ("chest pain", &["心内科", "胸外科"]),
    ("chest tightness", &["心内科", "呼吸内科"]),
    ("palpitations", &["心内科"]),
    ("shortness of breath", &["呼吸内科", "急诊科"]),
    ("stomach ache", &["消化内科"]),
    ("abdominal pain", &["消化内科", "普外科"]),
    ("severe abdominal pain", &["普外科", "消化内科"]),
    ("diarrhea", &["消化内科"]),
    ("nausea", &["消化内科"]),
    ("vomiting", &["消化内科"]),
    ("constipation", &["消化内科"]),
    ("rash", &["皮肤科"]),
    ("itching", &["皮肤科"]),
    ("joint pain", &["骨科", "风湿免疫科"]),
    ("back pain", &["骨科"]),
    ("frequent urination", &["泌尿外科"]),
    ("painful urination", &["泌尿外科"]),
    ("insomnia", &["精神心理科", "神经内科"]),
    ("anxiety", &["精神心理科"]),
    ("toothache", &["口腔科"]),
    ("blurred vision", &["眼科"]),
    ("fatigue", &["内科"]),
    ("fainting", &["急诊科"]),
    ("seizure", &["神经内科", "急诊科"]),
    ("heavy bleeding", &["急诊科"]),
];

static EMERGENCY_KEYWORDS: &[&str] = &[
    "胸痛",
    "呼吸困难",
    "昏迷",
    "抽搐",
    "大出血",
    "剧烈头痛",
    "意识不清",
    "chest pain",
    "shortness of breath",
    "fainting",
    "seizure",
    "heavy bleeding",
    "severe headache",
];

static SEVERITY_INTENSIFIERS: &[&str] = &[
    "剧烈", "严重", "突发", "突然", "持续加重", "持续",
    "severe", "sudden", "worsening", "persistent",
];

static DEPARTMENT_LABELS: &[(&str, &str)] = &[
    ("内科", "Internal Medicine"),
    ("神经内科", "Neurology"),
    ("心内科", "Cardiology"),
    ("感染科", "Infectious Diseases"),
    ("呼吸内科", "Respiratory Medicine"),
    ("耳鼻喉科", "ENT"),
    ("胸外科", "Thoracic Surgery"),
    ("消化内科", "Gastroenterology"),
    ("普外科", "General Surgery"),
    ("皮肤科", "Dermatology"),
    ("骨科", "Orthopedics"),
    ("风湿免疫科", "Rheumatology"),
    ("泌尿外科", "Urology"),
    ("精神心理科", "Psychiatry & Psychology"),
    ("口腔科", "Dentistry"),
    ("眼科", "Ophthalmology"),
    ("妇科", "Gynecology"),
    ("急诊科", "Emergency Department"),
];

/// English label for a canonical department name; unknown names pass through.
pub fn department_label(department: &str) -> &str {
    DEPARTMENT_LABELS
        .iter()
        .find(|(name, _)| *name == department)
        .map(|(_, label)| *label)
        .unwrap_or(department)
}

// ═══════════════════════════════════════════
// KnowledgeBase
// ═══════════════════════════════════════════

/// Read-only lookup tables shared by extraction and analysis.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    table: &'static [(&'static str, &'static [&'static str])],
    emergency_keywords: &'static [&'static str],
    intensifiers: &'static [&'static str],
    /// Symptom keywords, longest first.
    keywords_by_length: Vec<&'static str>,
}

impl KnowledgeBase {
    pub fn builtin() -> Self {
        let mut keywords_by_length: Vec<&'static str> =
            SYMPTOM_DEPARTMENTS.iter().map(|(k, _)| *k).collect();
        // Stable sort keeps table order among equal lengths.
        keywords_by_length.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));

        Self {
            table: SYMPTOM_DEPARTMENTS,
            emergency_keywords: EMERGENCY_KEYWORDS,
            intensifiers: SEVERITY_INTENSIFIERS,
            keywords_by_length,
        }
    }

    pub fn departments_for(&self, symptom: &str) -> Option<&'static [&'static str]> {
        self.table
            .iter()
            .find(|(keyword, _)| *keyword == symptom)
            .map(|(_, departments)| *departments)
    }

    /// Exact-name membership in the emergency keyword set.
    pub fn is_emergency_keyword(&self, symptom: &str) -> bool {
        self.emergency_keywords.iter().any(|k| *k == symptom)
    }

    /// Whether `text` contains any severity intensifier.
    pub fn has_intensifier(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.intensifiers.iter().any(|i| lower.contains(i))
    }

    pub fn keywords_by_length(&self) -> &[&'static str] {
        &self.keywords_by_length
    }

    /// Insertion-ordered union of departments for `symptoms`, capped at `cap`.
    /// Falls back to the general department when nothing maps.
    pub fn recommend_departments<'a, I>(&self, symptoms: I, cap: usize) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut departments: Vec<String> = Vec::new();
        'outer: for symptom in symptoms {
            let Some(mapped) = self.departments_for(symptom) else {
                continue;
            };
            for department in mapped {
                if departments.len() >= cap {
                    break 'outer;
                }
                if !departments.iter().any(|d| d == department) {
                    departments.push(department.to_string());
                }
            }
        }

        if departments.is_empty() {
            departments.push(GENERAL_DEPARTMENT.to_string());
        }
        departments
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
