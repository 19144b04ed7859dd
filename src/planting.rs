//! Planting records (phase, block, tree) and the workflow that links them.
//!
//! Each record is a flat set of string fields described by a field table.
//! The same table drives validation (every visible field must be non-empty
//! once trimmed) and the terminal form. Values chosen on an earlier step are
//! copied into the next record as read-only fields: the phase name and number
//! into the block, the block name and palm variety into each tree.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::parse_date_input;
use crate::error::{Error, FormKind, Result, ValidationError};

pub const BLOCK_STATUSES: [&str; 3] = ["Active", "Maintenance", "Inactive"];
pub const SOIL_TYPES: [&str; 4] = ["Loamy", "Clay", "Sandy", "Peaty"];
pub const DRAINAGE: [&str; 3] = ["Good", "Moderate", "Poor"];
pub const ACCESSIBILITY: [&str; 3] = ["Easy", "Moderate", "Difficult"];
pub const PALM_VARIETIES: [&str; 3] = ["Dura", "Tenera", "Pisifera"];
pub const TAG_TYPES: [&str; 2] = ["Oil Palm Tree", "Crop"];
pub const DISEASES: [&str; 5] = [
    "Ganoderma Basal Stem Rot (BSR)",
    "Fusarium Wilt",
    "Pink Disease",
    "Anthracnose",
    "Fatal Yellowing",
];
pub const TREE_STATUSES: [&str; 6] = [
    "Healthy",
    "Diseased",
    "Infected (Early Stage)",
    "Infected (Severe)",
    "Dead/Fallen",
    "Recovered",
];

/// Tree statuses under which a disease must be recorded.
const DISEASE_STATUSES: [&str; 3] = ["Diseased", "Infected (Early Stage)", "Infected (Severe)"];

const FIRST_YEAR: i32 = 1950;
const LAST_YEAR: i32 = 2026;

pub fn is_disease_status(status: &str) -> bool {
    DISEASE_STATUSES.contains(&status)
}

/// How a field is entered.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// Digits and one decimal point.
    Numeric,
    /// Typed date, stored as YYYY-MM-DD when recognised.
    Date,
    /// One of a fixed list of options.
    Choice(Vec<String>),
    /// Copied from an earlier step; never edited on this form.
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        FieldSpec { key, label, kind }
    }

    pub fn is_editable(&self) -> bool {
        self.kind != FieldKind::ReadOnly
    }
}

fn choice(options: &[&str]) -> FieldKind {
    FieldKind::Choice(options.iter().map(|s| s.to_string()).collect())
}

fn numbered(range: std::ops::RangeInclusive<u32>, suffix: &str) -> FieldKind {
    FieldKind::Choice(range.map(|n| format!("{n}{suffix}")).collect())
}

fn years_desc() -> FieldKind {
    FieldKind::Choice((FIRST_YEAR..=LAST_YEAR).rev().map(|y| y.to_string()).collect())
}

fn block_names() -> FieldKind {
    FieldKind::Choice(('A'..='Z').map(|c| format!("Block {c}")).collect())
}

/// A form-backed record with a field table.
pub trait Record {
    fn form(&self) -> FormKind;

    /// Fields currently shown on the form, in display order.
    fn fields(&self) -> Vec<FieldSpec>;

    fn value(&self, key: &str) -> Option<&str>;

    fn slot(&mut self, key: &str) -> Option<&mut String>;

    /// Called after a field changes.
    fn after_set(&mut self, _key: &str) {}

    /// Set an editable field by key.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let spec = self
            .fields()
            .into_iter()
            .find(|f| f.key == key)
            .ok_or_else(|| Error::InvalidInput(format!("unknown field '{key}'")))?;
        let stored = match spec.kind {
            FieldKind::ReadOnly => {
                return Err(Error::InvalidInput(format!("'{}' is read-only", spec.label)));
            }
            FieldKind::Date => parse_date_input(value)
                .map(|d| d.to_string())
                .unwrap_or_else(|| value.to_string()),
            _ => value.to_string(),
        };
        if let Some(slot) = self.slot(key) {
            *slot = stored;
        }
        self.after_set(key);
        Ok(())
    }

    /// Labels of visible fields that are empty after trimming.
    fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|f| self.value(f.key).map_or(true, |v| v.trim().is_empty()))
            .map(|f| f.label)
            .collect()
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.form(), missing))
        }
    }
}

/// Copy every editable, visible field of `source` into `target`.
pub fn copy_editable(target: &mut dyn Record, source: &dyn Record) -> Result<()> {
    for spec in source.fields() {
        if !spec.is_editable() {
            continue;
        }
        let value = source.value(spec.key).unwrap_or_default().to_string();
        target.set(spec.key, &value)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhaseRecord {
    pub phase_name: String,
    pub phase_number: String,
}

impl Record for PhaseRecord {
    fn form(&self) -> FormKind {
        FormKind::Phase
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("phaseName", "Phase Name", FieldKind::Text),
            FieldSpec::new("phaseNumber", "Phase Number", FieldKind::Numeric),
        ]
    }

    fn value(&self, key: &str) -> Option<&str> {
        match key {
            "phaseName" => Some(&self.phase_name),
            "phaseNumber" => Some(&self.phase_number),
            _ => None,
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "phaseName" => Some(&mut self.phase_name),
            "phaseNumber" => Some(&mut self.phase_number),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockRecord {
    pub phase_name: String,
    pub phase_number: String,
    pub block_name: String,
    pub block_number: String,
    pub area_hectare: String,
    pub area_acre: String,
    pub status: String,
    pub soil_type: String,
    pub drainage: String,
    pub accessibility: String,
    pub trees_per_hectare: String,
    pub total_trees: String,
    pub palm_variety: String,
    pub planting_date: String,
    pub palm_age: String,
    pub estimated_yield: String,
    pub slope: String,
}

impl BlockRecord {
    /// A blank block under `phase`.
    pub fn for_phase(phase: &PhaseRecord) -> Self {
        BlockRecord {
            phase_name: phase.phase_name.clone(),
            phase_number: phase.phase_number.clone(),
            ..BlockRecord::default()
        }
    }
}

impl Record for BlockRecord {
    fn form(&self) -> FormKind {
        FormKind::Block
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("phaseName", "Phase Name", FieldKind::ReadOnly),
            FieldSpec::new("phaseNumber", "Phase Number", FieldKind::ReadOnly),
            FieldSpec::new("blockName", "Block Name", block_names()),
            FieldSpec::new("blockNumber", "Block Number", numbered(1..=100, "")),
            FieldSpec::new("areaHectare", "Area (Hectare)", FieldKind::Numeric),
            FieldSpec::new("areaAcre", "Area (Acre)", FieldKind::Numeric),
            FieldSpec::new("status", "Status", choice(&BLOCK_STATUSES)),
            FieldSpec::new("soilType", "Soil Type", choice(&SOIL_TYPES)),
            FieldSpec::new("drainage", "Drainage", choice(&DRAINAGE)),
            FieldSpec::new("accessibility", "Accessibility", choice(&ACCESSIBILITY)),
            FieldSpec::new("treesPerHectare", "Trees per Hectare", FieldKind::Numeric),
            FieldSpec::new("totalTrees", "Total Trees", FieldKind::Numeric),
            FieldSpec::new("palmVariety", "Palm Variety", choice(&PALM_VARIETIES)),
            FieldSpec::new("plantingDate", "Planting Date", FieldKind::Date),
            FieldSpec::new("palmAge", "Palm Age (Years)", years_desc()),
            FieldSpec::new("slope", "Slope (%)", numbered(1..=100, "%")),
            FieldSpec::new("estimatedYield", "Estimated Yield (tons)", FieldKind::Numeric),
        ]
    }

    fn value(&self, key: &str) -> Option<&str> {
        let v = match key {
            "phaseName" => &self.phase_name,
            "phaseNumber" => &self.phase_number,
            "blockName" => &self.block_name,
            "blockNumber" => &self.block_number,
            "areaHectare" => &self.area_hectare,
            "areaAcre" => &self.area_acre,
            "status" => &self.status,
            "soilType" => &self.soil_type,
            "drainage" => &self.drainage,
            "accessibility" => &self.accessibility,
            "treesPerHectare" => &self.trees_per_hectare,
            "totalTrees" => &self.total_trees,
            "palmVariety" => &self.palm_variety,
            "plantingDate" => &self.planting_date,
            "palmAge" => &self.palm_age,
            "estimatedYield" => &self.estimated_yield,
            "slope" => &self.slope,
            _ => return None,
        };
        Some(v)
    }

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        let v = match key {
            "phaseName" => &mut self.phase_name,
            "phaseNumber" => &mut self.phase_number,
            "blockName" => &mut self.block_name,
            "blockNumber" => &mut self.block_number,
            "areaHectare" => &mut self.area_hectare,
            "areaAcre" => &mut self.area_acre,
            "status" => &mut self.status,
            "soilType" => &mut self.soil_type,
            "drainage" => &mut self.drainage,
            "accessibility" => &mut self.accessibility,
            "treesPerHectare" => &mut self.trees_per_hectare,
            "totalTrees" => &mut self.total_trees,
            "palmVariety" => &mut self.palm_variety,
            "plantingDate" => &mut self.planting_date,
            "palmAge" => &mut self.palm_age,
            "estimatedYield" => &mut self.estimated_yield,
            "slope" => &mut self.slope,
            _ => return None,
        };
        Some(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeRecord {
    pub tree_number: String,
    pub block: String,
    pub tag_type: String,
    #[serde(rename = "tagID")]
    pub tag_id: String,
    pub age: String,
    pub status: String,
    pub diseases: String,
    pub planting_date: String,
    pub height: String,
    pub trunk_circumference: String,
    pub variety: String,
    pub health_score: String,
    pub estimated_yield: String,
}

impl TreeRecord {
    /// A blank tree in `block`.
    pub fn for_block(block: &BlockRecord) -> Self {
        TreeRecord {
            block: block.block_name.clone(),
            variety: block.palm_variety.clone(),
            ..TreeRecord::default()
        }
    }
}

impl Record for TreeRecord {
    fn form(&self) -> FormKind {
        FormKind::Tree
    }

    fn fields(&self) -> Vec<FieldSpec> {
        let mut fields = vec![
            FieldSpec::new("treeNumber", "Tree Number", numbered(1..=100, "")),
            FieldSpec::new("block", "Block Name", FieldKind::ReadOnly),
            FieldSpec::new("tagType", "Tag Type", choice(&TAG_TYPES)),
            FieldSpec::new("tagID", "Tag ID", FieldKind::Text),
            FieldSpec::new("age", "Age (Year Planted)", years_desc()),
            FieldSpec::new("status", "Status", choice(&TREE_STATUSES)),
        ];
        if is_disease_status(&self.status) {
            fields.push(FieldSpec::new("diseases", "Disease", choice(&DISEASES)));
        }
        fields.extend([
            FieldSpec::new("plantingDate", "Planting Date", FieldKind::Date),
            FieldSpec::new("height", "Height (m)", FieldKind::Numeric),
            FieldSpec::new("trunkCircumference", "Trunk Circumference (cm)", FieldKind::Numeric),
            FieldSpec::new("variety", "Palm Variety", FieldKind::ReadOnly),
            FieldSpec::new("healthScore", "Health Score (%)", numbered(1..=100, "")),
            FieldSpec::new("estimatedYield", "Estimated Yield (tons)", FieldKind::Numeric),
        ]);
        fields
    }

    fn value(&self, key: &str) -> Option<&str> {
        let v = match key {
            "treeNumber" => &self.tree_number,
            "block" => &self.block,
            "tagType" => &self.tag_type,
            "tagID" => &self.tag_id,
            "age" => &self.age,
            "status" => &self.status,
            "diseases" => &self.diseases,
            "plantingDate" => &self.planting_date,
            "height" => &self.height,
            "trunkCircumference" => &self.trunk_circumference,
            "variety" => &self.variety,
            "healthScore" => &self.health_score,
            "estimatedYield" => &self.estimated_yield,
            _ => return None,
        };
        Some(v)
    }

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        let v = match key {
            "treeNumber" => &mut self.tree_number,
            "block" => &mut self.block,
            "tagType" => &mut self.tag_type,
            "tagID" => &mut self.tag_id,
            "age" => &mut self.age,
            "status" => &mut self.status,
            "diseases" => &mut self.diseases,
            "plantingDate" => &mut self.planting_date,
            "height" => &mut self.height,
            "trunkCircumference" => &mut self.trunk_circumference,
            "variety" => &mut self.variety,
            "healthScore" => &mut self.health_score,
            "estimatedYield" => &mut self.estimated_yield,
            _ => return None,
        };
        Some(v)
    }

    fn after_set(&mut self, key: &str) {
        if key == "status" && !is_disease_status(&self.status) {
            self.diseases.clear();
        }
    }
}

/// A finished phase/block with the trees recorded in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub phase: PhaseRecord,
    pub block: BlockRecord,
    pub trees: Vec<TreeRecord>,
}

/// Where the planting workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantingStep {
    Phase,
    Block,
    Tree,
    /// At least one tree saved; the user can add another or finish.
    Complete,
}

impl PlantingStep {
    pub fn title(self) -> &'static str {
        match self {
            PlantingStep::Phase => "Create Phase",
            PlantingStep::Block => "Create Block",
            PlantingStep::Tree => "Add Tree",
            PlantingStep::Complete => "Area Summary",
        }
    }
}

/// Phase -> Block -> Tree, each step handing its record to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantingWorkflow {
    step: PlantingStep,
    phase: PhaseRecord,
    block: Option<BlockRecord>,
    tree: Option<TreeRecord>,
    trees: Vec<TreeRecord>,
}

impl Default for PlantingWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantingWorkflow {
    pub fn new() -> Self {
        PlantingWorkflow {
            step: PlantingStep::Phase,
            phase: PhaseRecord::default(),
            block: None,
            tree: None,
            trees: Vec::new(),
        }
    }

    pub fn step(&self) -> PlantingStep {
        self.step
    }

    pub fn phase(&self) -> &PhaseRecord {
        &self.phase
    }

    pub fn block(&self) -> Option<&BlockRecord> {
        self.block.as_ref()
    }

    pub fn trees(&self) -> &[TreeRecord] {
        &self.trees
    }

    /// The record edited on the current step, if any.
    pub fn current(&self) -> Option<&dyn Record> {
        match self.step {
            PlantingStep::Phase => Some(&self.phase as &dyn Record),
            PlantingStep::Block => self.block.as_ref().map(|b| b as &dyn Record),
            PlantingStep::Tree => self.tree.as_ref().map(|t| t as &dyn Record),
            PlantingStep::Complete => None,
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut dyn Record> {
        match self.step {
            PlantingStep::Phase => Some(&mut self.phase as &mut dyn Record),
            PlantingStep::Block => self.block.as_mut().map(|b| b as &mut dyn Record),
            PlantingStep::Tree => self.tree.as_mut().map(|t| t as &mut dyn Record),
            PlantingStep::Complete => None,
        }
    }

    /// Validate the current record and move to the next step.
    ///
    /// On error nothing changes.
    pub fn submit(&mut self) -> std::result::Result<PlantingStep, ValidationError> {
        if let Some(record) = self.current() {
            record.validate()?;
        }
        match self.step {
            PlantingStep::Phase => {
                let block = match self.block.take() {
                    Some(mut block) => {
                        block.phase_name = self.phase.phase_name.clone();
                        block.phase_number = self.phase.phase_number.clone();
                        block
                    }
                    None => BlockRecord::for_phase(&self.phase),
                };
                self.block = Some(block);
                self.step = PlantingStep::Block;
            }
            PlantingStep::Block => {
                let Some(block) = self.block.as_ref() else {
                    return Ok(self.step);
                };
                let tree = match self.tree.take() {
                    Some(mut tree) => {
                        tree.block = block.block_name.clone();
                        tree.variety = block.palm_variety.clone();
                        tree
                    }
                    None => TreeRecord::for_block(block),
                };
                self.tree = Some(tree);
                self.step = PlantingStep::Tree;
            }
            PlantingStep::Tree => {
                if let Some(tree) = self.tree.take() {
                    self.trees.push(tree);
                }
                self.step = PlantingStep::Complete;
            }
            PlantingStep::Complete => {}
        }
        info!(step = self.step.title(), "planting step submitted");
        Ok(self.step)
    }

    /// Return to the previous step, keeping whatever was typed.
    ///
    /// Returns false when already at the first step.
    pub fn back(&mut self) -> bool {
        self.step = match self.step {
            PlantingStep::Phase => return false,
            PlantingStep::Block => PlantingStep::Phase,
            PlantingStep::Tree => PlantingStep::Block,
            PlantingStep::Complete => {
                self.tree = self.trees.pop();
                PlantingStep::Tree
            }
        };
        debug!(step = self.step.title(), "planting step back");
        true
    }

    /// Start another tree in the same block.
    pub fn add_another_tree(&mut self) {
        if self.step != PlantingStep::Complete {
            return;
        }
        if let Some(block) = self.block.as_ref() {
            self.tree = Some(TreeRecord::for_block(block));
            self.step = PlantingStep::Tree;
        }
    }

    /// The finished area, once at least one tree has been saved.
    pub fn finish(&self) -> Option<AreaRecord> {
        if self.step != PlantingStep::Complete {
            return None;
        }
        Some(AreaRecord {
            phase: self.phase.clone(),
            block: self.block.clone()?,
            trees: self.trees.clone(),
        })
    }
}

/// A whole planting submission as one JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlantingDraft {
    pub phase: PhaseRecord,
    pub block: BlockRecord,
    pub trees: Vec<TreeRecord>,
}

/// Run a draft through the workflow step by step.
///
/// Read-only values in the draft are ignored; they are always copied from
/// the previous step. A draft with no trees fails on the empty tree form.
pub fn run_draft(draft: &PlantingDraft) -> Result<AreaRecord> {
    let mut wf = PlantingWorkflow::new();
    apply(&mut wf, &draft.phase)?;
    wf.submit()?;
    apply(&mut wf, &draft.block)?;
    wf.submit()?;

    let mut trees = draft.trees.iter();
    let first = trees.next().cloned().unwrap_or_default();
    apply(&mut wf, &first)?;
    wf.submit()?;
    for tree in trees {
        wf.add_another_tree();
        apply(&mut wf, tree)?;
        wf.submit()?;
    }
    wf.finish()
        .ok_or_else(|| Error::InvalidInput("planting workflow did not complete".into()))
}

fn apply(wf: &mut PlantingWorkflow, source: &dyn Record) -> Result<()> {
    match wf.current_mut() {
        Some(target) => copy_editable(target, source),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_phase() -> PhaseRecord {
        PhaseRecord {
            phase_name: "North Estate".into(),
            phase_number: "2".into(),
        }
    }

    fn fill_block(block: &mut BlockRecord) {
        let values = [
            ("blockName", "Block C"),
            ("blockNumber", "12"),
            ("areaHectare", "40.5"),
            ("areaAcre", "100"),
            ("status", "Active"),
            ("soilType", "Loamy"),
            ("drainage", "Good"),
            ("accessibility", "Easy"),
            ("treesPerHectare", "136"),
            ("totalTrees", "5500"),
            ("palmVariety", "Tenera"),
            ("plantingDate", "2015-03-01"),
            ("palmAge", "2015"),
            ("slope", "5%"),
            ("estimatedYield", "22"),
        ];
        for (k, v) in values {
            block.set(k, v).unwrap();
        }
    }

    fn fill_tree(tree: &mut TreeRecord, status: &str) {
        let values = [
            ("treeNumber", "7"),
            ("tagType", "Oil Palm Tree"),
            ("tagID", "T-0007"),
            ("age", "2015"),
            ("status", status),
            ("plantingDate", "2015-03-02"),
            ("height", "8.5"),
            ("trunkCircumference", "210"),
            ("healthScore", "90"),
            ("estimatedYield", "0.2"),
        ];
        for (k, v) in values {
            tree.set(k, v).unwrap();
        }
    }

    #[test]
    fn test_empty_block_names_every_missing_field() {
        let block = BlockRecord::for_phase(&filled_phase());
        let err = block.validate().unwrap_err();
        assert_eq!(err.form, FormKind::Block);
        assert_eq!(err.missing.len(), 15);
        assert!(err.missing.contains(&"Soil Type"));
        assert!(!err.missing.contains(&"Phase Name"));
        assert!(err.message().contains("Soil Type"));
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut block = BlockRecord::for_phase(&filled_phase());
        fill_block(&mut block);
        block.set("areaAcre", "   ").unwrap();
        assert_eq!(block.validate().unwrap_err().missing, vec!["Area (Acre)"]);
    }

    #[test]
    fn test_read_only_fields_reject_edits() {
        let mut block = BlockRecord::for_phase(&filled_phase());
        assert!(matches!(block.set("phaseName", "Other"), Err(Error::InvalidInput(_))));
        assert_eq!(block.phase_name, "North Estate");
        assert!(matches!(block.set("nope", "x"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_tree_copies_block_name_and_variety() {
        let mut block = BlockRecord::for_phase(&filled_phase());
        fill_block(&mut block);
        let tree = TreeRecord::for_block(&block);
        assert_eq!(tree.block, "Block C");
        assert_eq!(tree.variety, "Tenera");
    }

    #[test]
    fn test_disease_required_only_for_disease_status() {
        let mut block = BlockRecord::for_phase(&filled_phase());
        fill_block(&mut block);

        let mut healthy = TreeRecord::for_block(&block);
        fill_tree(&mut healthy, "Healthy");
        assert!(healthy.validate().is_ok());

        let mut sick = TreeRecord::for_block(&block);
        fill_tree(&mut sick, "Diseased");
        assert_eq!(sick.validate().unwrap_err().missing, vec!["Disease"]);
        sick.set("diseases", "Pink Disease").unwrap();
        assert!(sick.validate().is_ok());
    }

    #[test]
    fn test_non_disease_status_clears_disease() {
        let mut tree = TreeRecord::default();
        tree.set("status", "Infected (Severe)").unwrap();
        tree.set("diseases", "Fusarium Wilt").unwrap();
        tree.set("status", "Recovered").unwrap();
        assert_eq!(tree.diseases, "");
        assert!(tree.set("diseases", "Fusarium Wilt").is_err());
    }

    #[test]
    fn test_date_fields_are_normalised() {
        let mut tree = TreeRecord::default();
        tree.set("plantingDate", " 2020-01-05 ").unwrap();
        assert_eq!(tree.planting_date, "2020-01-05");
        tree.set("plantingDate", "someday").unwrap();
        assert_eq!(tree.planting_date, "someday");
    }

    #[test]
    fn test_workflow_walks_phase_block_tree() {
        let mut wf = PlantingWorkflow::new();
        assert_eq!(wf.step(), PlantingStep::Phase);
        assert!(wf.submit().is_err());
        assert_eq!(wf.step(), PlantingStep::Phase);

        wf.current_mut().unwrap().set("phaseName", "North Estate").unwrap();
        wf.current_mut().unwrap().set("phaseNumber", "2").unwrap();
        assert_eq!(wf.submit().unwrap(), PlantingStep::Block);
        assert_eq!(wf.block().unwrap().phase_name, "North Estate");

        let err = wf.submit().unwrap_err();
        assert_eq!(err.form, FormKind::Block);
        assert_eq!(wf.step(), PlantingStep::Block);

        let mut block = wf.block().unwrap().clone();
        fill_block(&mut block);
        copy_editable(wf.current_mut().unwrap(), &block).unwrap();
        assert_eq!(wf.submit().unwrap(), PlantingStep::Tree);

        let mut tree = TreeRecord::default();
        fill_tree(&mut tree, "Healthy");
        copy_editable(wf.current_mut().unwrap(), &tree).unwrap();
        assert_eq!(wf.submit().unwrap(), PlantingStep::Complete);

        let area = wf.finish().unwrap();
        assert_eq!(area.phase.phase_name, "North Estate");
        assert_eq!(area.block.block_name, "Block C");
        assert_eq!(area.trees.len(), 1);
        assert_eq!(area.trees[0].block, "Block C");
        assert_eq!(area.trees[0].variety, "Tenera");
    }

    #[test]
    fn test_back_keeps_typed_values_and_refreshes_copies() {
        let mut wf = PlantingWorkflow::new();
        copy_editable(wf.current_mut().unwrap(), &filled_phase()).unwrap();
        wf.submit().unwrap();
        wf.current_mut().unwrap().set("soilType", "Clay").unwrap();

        assert!(wf.back());
        assert_eq!(wf.step(), PlantingStep::Phase);
        wf.current_mut().unwrap().set("phaseName", "South Estate").unwrap();
        wf.submit().unwrap();

        let block = wf.block().unwrap();
        assert_eq!(block.soil_type, "Clay");
        assert_eq!(block.phase_name, "South Estate");
        assert!(!PlantingWorkflow::new().back());
    }

    #[test]
    fn test_run_draft_with_two_trees() {
        let mut block = BlockRecord::default();
        fill_block(&mut block);
        block.phase_name = "ignored".into();
        let mut t1 = TreeRecord::default();
        fill_tree(&mut t1, "Healthy");
        let mut t2 = TreeRecord::default();
        fill_tree(&mut t2, "Diseased");
        t2.set("diseases", "Anthracnose").unwrap();

        let draft = PlantingDraft {
            phase: filled_phase(),
            block,
            trees: vec![t1, t2],
        };
        let area = run_draft(&draft).unwrap();
        assert_eq!(area.block.phase_name, "North Estate");
        assert_eq!(area.trees.len(), 2);
        assert_eq!(area.trees[1].diseases, "Anthracnose");
    }

    #[test]
    fn test_run_draft_without_trees_fails_on_tree_form() {
        let mut block = BlockRecord::default();
        fill_block(&mut block);
        let draft = PlantingDraft {
            phase: filled_phase(),
            block,
            trees: Vec::new(),
        };
        match run_draft(&draft) {
            Err(Error::Validation(err)) => assert_eq!(err.form, FormKind::Tree),
            other => panic!("expected tree validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_relative_date_is_kept_as_typed() {
        let mut block = BlockRecord::for_phase(&filled_phase());
        block.set("plantingDate", "in 99999999d").unwrap();
        assert_eq!(block.planting_date, "in 99999999d");
    }

    #[test]
    fn test_area_wire_format() {
        let json = r#"{"phase": {"phaseName": "P1"}, "block": {"blockName": "Block A"},
                       "trees": [{"treeNumber": "1", "tagID": "X"}]}"#;
        let draft: PlantingDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.phase.phase_number, "");
        assert_eq!(draft.trees[0].tag_id, "X");
    }
}
