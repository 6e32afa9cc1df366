/// The fixed workshop roster. Seeded into the store once at startup; the API
/// never creates or deletes mechanics.
pub const MECHANIC_ROSTER: &[&str] = &[
    "IngenieroErick",
    "ChristianCobra",
    "Chicanto",
    "SpiderSteven",
    "LaBestiaPelua",
    "PhonKing",
    "TurboCarlos",
];
