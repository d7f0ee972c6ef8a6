use crate::{CardMetadata, CardRecord};

/// (name, set, type line, mana cost, rarity)
const EMBEDDED_CARDS: &[(&str, &str, &str, &str, &str)] = &[
    ("Lightning Bolt", "lea", "Instant", "{R}", "common"),
    ("Lightning Strike", "m19", "Instant", "{1}{R}", "common"),
    ("Counterspell", "lea", "Instant", "{U}{U}", "uncommon"),
    ("Dark Ritual", "lea", "Instant", "{B}", "common"),
    ("Giant Growth", "lea", "Instant", "{G}", "common"),
    ("Swords to Plowshares", "lea", "Instant", "{W}", "uncommon"),
    ("Llanowar Elves", "lea", "Creature — Elf Druid", "{G}", "common"),
    ("Serra Angel", "lea", "Creature — Angel", "{3}{W}{W}", "uncommon"),
    ("Shivan Dragon", "lea", "Creature — Dragon", "{4}{R}{R}", "rare"),
    ("Sol Ring", "lea", "Artifact", "{1}", "uncommon"),
    ("Black Lotus", "lea", "Artifact", "{0}", "rare"),
    ("Ancestral Recall", "lea", "Instant", "{U}", "rare"),
    ("Time Walk", "lea", "Sorcery", "{1}{U}", "rare"),
    ("Wrath of God", "lea", "Sorcery", "{2}{W}{W}", "rare"),
    ("Birds of Paradise", "lea", "Creature — Bird", "{G}", "rare"),
    ("Brainstorm", "ice", "Instant", "{U}", "common"),
    ("Ponder", "lrw", "Sorcery", "{U}", "common"),
    ("Opt", "inv", "Instant", "{U}", "common"),
    ("Duress", "usg", "Sorcery", "{B}", "common"),
    ("Thoughtseize", "lrw", "Sorcery", "{B}", "rare"),
    ("Path to Exile", "con", "Instant", "{W}", "uncommon"),
    ("Tarmogoyf", "fut", "Creature — Lhurgoyf", "{1}{G}", "rare"),
    ("Snapcaster Mage", "isd", "Creature — Human Wizard", "{1}{U}", "rare"),
    ("Delver of Secrets", "isd", "Creature — Human Wizard", "{U}", "common"),
    ("Thalia, Guardian of Thraben", "dka", "Legendary Creature — Human Soldier", "{1}{W}", "rare"),
    ("Grizzly Bears", "lea", "Creature — Bear", "{1}{G}", "common"),
    ("Shock", "sth", "Instant", "{R}", "common"),
    ("Cultivate", "m11", "Sorcery", "{2}{G}", "common"),
    ("Cancel", "m19", "Instant", "{1}{U}{U}", "common"),
    ("Doom Blade", "m10", "Instant", "{1}{B}", "common"),
    ("Island", "lea", "Basic Land — Island", "", "common"),
    ("Mountain", "lea", "Basic Land — Mountain", "", "common"),
    ("Forest", "lea", "Basic Land — Forest", "", "common"),
    ("Plains", "lea", "Basic Land — Plains", "", "common"),
    ("Swamp", "lea", "Basic Land — Swamp", "", "common"),
];

/// Built-in card records used when no bulk data file is available.
pub(crate) fn embedded_records() -> impl Iterator<Item = CardRecord> {
    EMBEDDED_CARDS
        .iter()
        .map(|&(name, set, type_line, mana_cost, rarity)| CardRecord {
            name: name.to_string(),
            metadata: CardMetadata::default()
                .with("set", set)
                .with("type_line", type_line)
                .with("mana_cost", mana_cost)
                .with("rarity", rarity),
        })
}
