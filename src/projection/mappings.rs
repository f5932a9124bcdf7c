//! Field mappings for the six page-indexed datasets

use super::rule::{Fallback, Pick, Rule};
use super::Mapping;

use Fallback::{EmptyList, Null};
use Rule::{Field, IdList, Join, LengthOf, ObjectField, OrDefault, SplitPick};

pub const USER: &Mapping = &[
    ("id", Field(&["uid"])),
    ("title", Field(&["name"])),
    ("fname", OrDefault(&["field_first_name"], Null)),
    ("lname", OrDefault(&["field_last_name"], Null)),
    ("created", Field(&["created"])),
    ("da_membership", OrDefault(&["field_da_ind_membership"], Null)),
    ("slack", OrDefault(&["field_slack"], Null)),
    ("mentors", IdList(&["field_mentors"])),
    ("countries", OrDefault(&["field_country"], Null)),
    ("language", OrDefault(&["field_user_primary_language"], Null)),
    ("languages", OrDefault(&["field_languages"], EmptyList)),
    ("timezone", OrDefault(&["timezone"], Null)),
    ("region", SplitPick(&["timezone"], '/', Pick::First)),
    ("city", SplitPick(&["timezone"], '/', Pick::Last)),
    ("organizations", IdList(&["field_organizations"])),
    ("industries", OrDefault(&["field_industries"], Null)),
    ("contributions", OrDefault(&["field_contributed"], Null)),
    ("events", OrDefault(&["field_events_attended"], Null)),
];

pub const ORGANIZATION: &Mapping = &[
    ("id", Field(&["nid"])),
    ("title", Field(&["title"])),
    ("created", Field(&["created"])),
    ("changed", Field(&["changed"])),
    ("author", OrDefault(&["author", "id"], Null)),
    ("url", ObjectField(&["field_link"], "url")),
    ("budget", OrDefault(&["field_budget"], Null)),
    (
        "headquarters",
        OrDefault(&["field_organization_headquarters"], Null),
    ),
];

pub const MODULE: &Mapping = &[
    ("id", Field(&["nid"])),
    ("title", Field(&["title"])),
    ("created", Field(&["created"])),
    ("changed", Field(&["changed"])),
    ("author", OrDefault(&["author", "id"], Null)),
    ("slug", Field(&["field_project_machine_name"])),
    ("stars", LengthOf(&["flag_project_star_user"])),
    (
        "security_status",
        Field(&["field_security_advisory_coverage"]),
    ),
    (
        "maintenance_status",
        ObjectField(&["taxonomy_vocabulary_44"], "id"),
    ),
    (
        "development_status",
        ObjectField(&["taxonomy_vocabulary_46"], "id"),
    ),
    ("categories", IdList(&["taxonomy_vocabulary_3"])),
];

pub const EVENT: &Mapping = &[
    ("id", Field(&["nid"])),
    ("title", Field(&["title"])),
    ("from", OrDefault(&["field_date_of_event", "value"], Null)),
    ("to", OrDefault(&["field_date_of_event", "value2"], Null)),
    (
        "duration",
        OrDefault(&["field_date_of_event", "duration"], Null),
    ),
    ("event_type", Join(&["field_event_type"], "")),
    ("event_format", Join(&["field_event_format"], "")),
    ("author", OrDefault(&["author", "id"], Null)),
    ("speakers", IdList(&["field_event_speakers"])),
    ("sponsors", IdList(&["field_event_sponsors"])),
    ("volunteers", IdList(&["field_event_volunteers"])),
    ("organizers", IdList(&["field_organizers"])),
    ("city", ObjectField(&["field_event_address"], "locality")),
    ("country", ObjectField(&["field_event_address"], "country")),
];

pub const TAXONOMY_TERM: &Mapping = &[("id", Field(&["tid"])), ("name", Field(&["name"]))];

pub const THEME: &Mapping = &[
    ("id", Field(&["nid"])),
    ("title", Field(&["title"])),
    ("created", Field(&["created"])),
    ("changed", Field(&["changed"])),
    ("author", OrDefault(&["author", "id"], Null)),
    ("slug", Field(&["field_project_machine_name"])),
    ("stars", LengthOf(&["flag_project_star_user"])),
];
