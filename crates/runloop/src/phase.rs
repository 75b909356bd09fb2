use serde::Deserialize;

/// Ordered queues within one tick.
///
/// Phases run in declaration order. Coalesced flushes default to
/// [`Phase::AfterRender`] so they observe every lookup issued while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
	/// Binding synchronisation.
	Sync,
	/// General deferred actions.
	Actions,
	/// View rendering.
	Render,
	/// Work that must see the rendered state.
	AfterRender,
	/// Teardown.
	Destroy,
}

impl Phase {
	/// Number of phases in a tick.
	pub const COUNT: usize = 5;

	/// All phases in execution order.
	pub const ALL: [Phase; Self::COUNT] = [Self::Sync, Self::Actions, Self::Render, Self::AfterRender, Self::Destroy];

	pub(crate) const fn index(self) -> usize {
		match self {
			Self::Sync => 0,
			Self::Actions => 1,
			Self::Render => 2,
			Self::AfterRender => 3,
			Self::Destroy => 4,
		}
	}

	/// Stable name used in logs and config files.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Sync => "sync",
			Self::Actions => "actions",
			Self::Render => "render",
			Self::AfterRender => "after-render",
			Self::Destroy => "destroy",
		}
	}
}

impl std::fmt::Display for Phase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
