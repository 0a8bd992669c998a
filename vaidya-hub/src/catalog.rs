//! Built-in plant catalog, tribal languages and seeded example remedies

use std::sync::OnceLock;

use chrono::{TimeZone, Utc};
use vaidya_common::models::{Plant, Remedy, TribalLanguage, TribalName, SEEDED_REMEDY_PREFIX};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn tribal(language: &str, name: &str, pronunciation: &str) -> TribalName {
    TribalName {
        language: language.to_string(),
        name: name.to_string(),
        pronunciation: pronunciation.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn plant(
    id: u32,
    english_name: &str,
    hindi_name: &str,
    scientific_name: &str,
    family: &str,
    is_endangered: bool,
    tribal_names: Vec<TribalName>,
    medicinal_uses: &[&str],
    preparation_methods: &[&str],
    precautions: &[&str],
) -> Plant {
    Plant {
        id,
        english_name: english_name.to_string(),
        hindi_name: hindi_name.to_string(),
        scientific_name: scientific_name.to_string(),
        family: family.to_string(),
        is_medicinal: true,
        is_endangered,
        tribal_names,
        medicinal_uses: strings(medicinal_uses),
        preparation_methods: strings(preparation_methods),
        precautions: strings(precautions),
    }
}

/// All catalog plants, ordered by id
pub fn plants() -> &'static [Plant] {
    static PLANTS: OnceLock<Vec<Plant>> = OnceLock::new();
    PLANTS.get_or_init(|| {
        vec![
            plant(
                1,
                "Neem",
                "नीम",
                "Azadirachta indica",
                "Meliaceae",
                false,
                vec![
                    tribal("Santhali", "Neem Dare", "neem da-ray"),
                    tribal("Gondi", "Vepa", "vay-pa"),
                ],
                &[
                    "Antiseptic, treats skin diseases like eczema and acne.",
                    "Used as a natural pesticide.",
                    "Improves oral health, used in toothpastes.",
                ],
                &[
                    "Paste of leaves applied on skin.",
                    "Twigs used as a toothbrush.",
                    "Decoction of bark for fevers.",
                ],
                &["Excessive internal use can cause liver damage. Not recommended for pregnant women."],
            ),
            plant(
                2,
                "Tulsi (Holy Basil)",
                "तुलसी",
                "Ocimum tenuiflorum",
                "Lamiaceae",
                false,
                vec![
                    tribal("Ho", "Tulsi Baha", "tool-see ba-ha"),
                    tribal("Bhil", "Tulsi", "tool-see"),
                ],
                &[
                    "Boosts immunity, effective against cough and cold.",
                    "Reduces stress and anxiety (adaptogen).",
                    "Purifies blood and improves skin health.",
                ],
                &[
                    "Leaves chewed raw or brewed as tea.",
                    "Juice of leaves mixed with honey for cough.",
                    "Used in religious ceremonies.",
                ],
                &["Can lower blood sugar, so diabetics should be cautious. May have anti-fertility effects."],
            ),
            plant(
                3,
                "Ashwagandha",
                "अश्वगंधा",
                "Withania somnifera",
                "Solanaceae",
                false,
                vec![tribal("Khasi", "Tirah", "tee-rah")],
                &[
                    "Reduces stress and anxiety, improves sleep.",
                    "Boosts strength, stamina, and energy levels.",
                    "Enhances cognitive function and memory.",
                ],
                &["Root powder mixed with milk or honey.", "Capsules or extracts.", "Tinctures."],
                &["Avoid during pregnancy. Can cause stomach upset in large doses."],
            ),
            plant(
                4,
                "Turmeric",
                "हल्दी",
                "Curcuma longa",
                "Zingiberaceae",
                false,
                vec![tribal("Gondi", "Hardi", "har-dee")],
                &[
                    "Potent anti-inflammatory and antioxidant.",
                    "Used for healing wounds and skin problems.",
                    "Aids in digestion and liver function.",
                ],
                &[
                    "Rhizome powder mixed with milk (golden milk).",
                    "Paste of fresh rhizome applied to wounds.",
                    "Used as a spice in cooking.",
                ],
                &["High doses can cause stomach issues. Can act as a blood thinner."],
            ),
            plant(
                5,
                "Amla (Indian Gooseberry)",
                "आंवला",
                "Phyllanthus emblica",
                "Phyllanthaceae",
                false,
                Vec::new(),
                &[
                    "Extremely rich in Vitamin C, boosts immunity.",
                    "Promotes hair health and prevents premature graying.",
                    "Improves eyesight and purifies blood.",
                ],
                &[
                    "Eaten raw, pickled, or as a powder.",
                    "Juice consumed for health benefits.",
                    "Used in hair oils and masks.",
                ],
                &["May increase acidity in some individuals."],
            ),
            plant(
                6,
                "Brahmi",
                "ब्राह्मी",
                "Bacopa monnieri",
                "Plantaginaceae",
                false,
                Vec::new(),
                &[
                    "Enhances memory, concentration, and cognitive functions.",
                    "Reduces anxiety and stress.",
                    "Supports nervous system health.",
                ],
                &[
                    "Fresh leaves chewed or made into juice.",
                    "Powder mixed with ghee or honey.",
                    "Used in medicated oils for head massage.",
                ],
                &["Can cause stomach cramps and nausea on an empty stomach."],
            ),
            plant(
                7,
                "Aloe Vera",
                "घृतकुमारी",
                "Aloe barbadensis miller",
                "Asphodelaceae",
                false,
                Vec::new(),
                &[
                    "Soothes skin burns, irritations, and sunburns.",
                    "Promotes digestion and detoxification.",
                    "Moisturizes skin and hair.",
                ],
                &[
                    "Gel from leaves applied directly to the skin.",
                    "Juice consumed for internal benefits (with caution).",
                    "Used in numerous cosmetic products.",
                ],
                &["Latex from the leaf can be a potent laxative and cause cramps."],
            ),
            plant(
                8,
                "Shatavari",
                "शतावरी",
                "Asparagus racemosus",
                "Asparagaceae",
                false,
                Vec::new(),
                &[
                    "Supports female reproductive health.",
                    "Acts as an adaptogen, helping the body manage stress.",
                    "Aids digestion and has antioxidant properties.",
                ],
                &["Root powder taken with milk.", "Liquid extracts or capsules."],
                &["May have diuretic effects. People allergic to asparagus should avoid it."],
            ),
            plant(
                9,
                "Guggul",
                "गुग्गुल",
                "Commiphora wightii",
                "Burseraceae",
                true,
                Vec::new(),
                &[
                    "Helps in weight management.",
                    "Supports joint health and reduces inflammation.",
                    "Used to manage cholesterol levels.",
                ],
                &[
                    "Resin purified and used in tablet form.",
                    "Extracts standardized for guggulsterones.",
                ],
                &["Can cause skin rashes or digestive upset. Avoid during pregnancy."],
            ),
        ]
    })
}

pub fn plant_by_id(id: u32) -> Option<&'static Plant> {
    plants().iter().find(|p| p.id == id)
}

pub fn tribal_languages() -> &'static [TribalLanguage] {
    static LANGUAGES: OnceLock<Vec<TribalLanguage>> = OnceLock::new();
    LANGUAGES.get_or_init(|| {
        [
            (1, "Santhali", "East India"),
            (2, "Gondi", "Central India"),
            (3, "Bhil", "West India"),
            (4, "Ho", "East India"),
            (5, "Khasi", "Northeast India"),
            (6, "Mundari", "East India"),
        ]
        .into_iter()
        .map(|(id, name, region)| TribalLanguage {
            id,
            name: name.to_string(),
            region: region.to_string(),
        })
        .collect()
    })
}

/// Case-insensitive lookup by language name
pub fn language_by_name(name: &str) -> Option<&'static TribalLanguage> {
    tribal_languages()
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(name.trim()))
}

/// The seeded example with exactly this id
pub fn seeded_remedy(id: &str) -> Option<&'static Remedy> {
    seeded_remedies().iter().find(|r| r.id == id)
}

/// Example remedies shown to every visitor; ids are `initial-N`
pub fn seeded_remedies() -> &'static [Remedy] {
    static SEEDED: OnceLock<Vec<Remedy>> = OnceLock::new();
    SEEDED.get_or_init(|| {
        let entries = [
            (
                "Neem",
                "A paste of fresh neem leaves applied twice a day helps clear acne and minor skin infections.",
                "Hindi",
                4,
                (2024, 3, 12),
                14,
                1,
            ),
            (
                "Tulsi (Holy Basil)",
                "Boil a handful of tulsi leaves with ginger and drink warm to ease cough and cold.",
                "English",
                5,
                (2024, 5, 2),
                22,
                2,
            ),
            (
                "Turmeric",
                "Warm milk with a pinch of turmeric before bed soothes sore throat and aids recovery.",
                "Gondi",
                4,
                (2024, 7, 19),
                9,
                0,
            ),
        ];

        entries
            .into_iter()
            .enumerate()
            .map(
                |(i, (plant_name, description, language, rating, (y, m, d), up, down))| Remedy {
                    id: format!("{}{}", SEEDED_REMEDY_PREFIX, i),
                    plant_name: plant_name.to_string(),
                    description: description.to_string(),
                    language: language.to_string(),
                    effectiveness_rating: rating,
                    photo_data_uri: None,
                    submitted_at: Utc
                        .with_ymd_and_hms(y, m, d, 9, 0, 0)
                        .single()
                        .unwrap_or_default(),
                    upvotes: up,
                    downvotes: down,
                    is_plausible: Some(true),
                    verification_notes: None,
                },
            )
            .collect()
    })
}
