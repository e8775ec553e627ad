//! Block Analysis Pipeline
//!
//! This module runs every single-block analysis over one lifted block in the
//! correct order and gathers their facts into one [`AnalysisResult`].
//!
//! # Pipeline Stages
//! 1. **No-op compaction**: drop `NoOp` statements from the block
//! 2. **Exits and instructions**: conditional exits, instruction addresses, block size
//! 3. **Default exit**: resolve the terminal `next` expression
//! 4. **No-op classification**: detect blocks that only fall through
//! 5. **Abstract interpretation**: data references and constant temporaries
//!
//! Each stage can be switched off through [`PassSelection`](crate::engine::config::PassSelection).

use crate::engine::analysis::{AnalysisResult, BlockSummarizer, ExitResolver, Interpreter};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::AnalysisError;
use crate::engine::ir::instruction::IrBlock;
use crate::runtime::context::AnalysisContext;
use crate::target::GuestArch;

/// Analysis pipeline orchestrator.
#[derive(Debug, Clone, Default)]
pub struct BlockAnalyzer {
    config: AnalysisConfig,
}

impl BlockAnalyzer {
    /// Create an analyzer from a validated configuration.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InvalidConfig`] if `config` fails validation
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one block.
    ///
    /// # Arguments
    /// * `ctx` - Read-only regions and initial register values
    /// * `block` - Lifted block; compacted in place when no-op removal is enabled
    /// * `arch` - Guest architecture of the block
    ///
    /// # Returns
    /// `Result<AnalysisResult, AnalysisError>` - Facts gathered by the enabled passes
    ///
    /// # Errors
    /// Returns [`AnalysisError::MissingInstructionMark`] if the block is
    /// malformed; later stages do not run
    ///
    /// # Examples
    /// ```rust,ignore
    /// let analyzer = BlockAnalyzer::new(AnalysisConfig::load(Path::new("blockscan.json"))?)?;
    /// let result = analyzer.analyze(&ctx, &mut block, GuestArch::Arm)?;
    /// println!("{}", serde_json::to_string_pretty(&result)?);
    /// ```
    #[inline(never)] // Large function - don't inline
    pub fn analyze(
        &self,
        ctx: &AnalysisContext,
        block: &mut IrBlock,
        arch: GuestArch,
    ) -> Result<AnalysisResult, AnalysisError> {
        let passes = self.config.passes;
        let mut result: AnalysisResult = AnalysisResult::with_config(&self.config);
        log::info!("Analyzing {} block with {} statements...", arch, block.len());

        if passes.remove_noops {
            log::info!("Step 1: Removing no-op statements...");
            let removed: usize = BlockSummarizer::remove_noops(block);
            log::debug!("Removed {} no-op statements", removed);
        }

        if passes.exits_and_instructions {
            log::info!("Step 2: Collecting exits and instruction addresses...");
            BlockSummarizer::extract_exits_and_instructions(block, &mut result)?;
        }

        if passes.default_exit {
            log::info!("Step 3: Resolving default exit...");
            result.default_exit = ExitResolver::resolve(block);
        }

        if passes.noop_block {
            log::info!("Step 4: Classifying no-op block...");
            result.is_noop_block = BlockSummarizer::is_noop_block(block);
        }

        if passes.interpreter {
            log::info!("Step 5: Running abstract interpreter...");
            Interpreter::run_into(ctx, block, arch, self.config.interpreter, &mut result)?;
        }

        log::info!(
            "Block analysis complete: {} instructions, {} data refs",
            result.instruction_count(),
            result.data_refs.total()
        );
        Ok(result)
    }
}
