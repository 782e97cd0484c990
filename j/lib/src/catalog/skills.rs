//! Favourite skills and recommended skill repositories.

/// A repository (`owner/name`) that publishes skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillRepo {
    pub repo: &'static str,
    pub description: &'static str,
}

/// A skill within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skill {
    pub repo: &'static str,
    pub name: &'static str,
}

static FAVORITE_SKILLS: &[Skill] = &[
    Skill { repo: "anthropics/skills", name: "frontend-design" },
    Skill { repo: "expo/skills", name: "upgrading-expo" },
    Skill { repo: "giuseppe-trisciuoglio/developer-kit", name: "shadcn-ui" },
    Skill { repo: "sickn33/antigravity-awesome-skills", name: "last30days" },
    Skill { repo: "tobi/qmd", name: "qmd" },
    Skill { repo: "vercel-labs/agent-skills", name: "vercel-react-best-practices" },
    Skill { repo: "vercel-labs/agent-skills", name: "vercel-react-native-skills" },
];

static SKILL_REPOS: &[SkillRepo] = &[
    SkillRepo { repo: "anthropics/skills", description: "Official Anthropic skills for Claude" },
    SkillRepo { repo: "better-auth/skills", description: "Authentication best practices" },
    SkillRepo { repo: "code-with-beto/skills", description: "Beto's development skills" },
    SkillRepo { repo: "coreyhaines31/marketingskills", description: "Marketing and SEO skills" },
    SkillRepo { repo: "expo/skills", description: "Expo and React Native mobile development" },
    SkillRepo { repo: "firecrawl/cli", description: "Web content extraction for AI agents" },
    SkillRepo {
        repo: "giuseppe-trisciuoglio/developer-kit",
        description: "Developer toolkit including shadcn-ui",
    },
    SkillRepo { repo: "obra/superpowers", description: "Development workflow and productivity skills" },
    SkillRepo { repo: "remotion-dev/skills", description: "Remotion video creation skills" },
    SkillRepo { repo: "resend/email-best-practices", description: "Email development best practices" },
    SkillRepo { repo: "supabase/agent-skills", description: "Supabase database and backend skills" },
    SkillRepo { repo: "tobi/qmd", description: "Local search engine for docs and knowledge bases" },
    SkillRepo {
        repo: "vercel-labs/agent-skills",
        description: "Vercel React and web development skills",
    },
];

pub fn favorite_skills() -> &'static [Skill] {
    FAVORITE_SKILLS
}

pub fn skill_repos() -> &'static [SkillRepo] {
    SKILL_REPOS
}

pub fn skill_repo_by_name(repo: &str) -> Option<&'static SkillRepo> {
    SKILL_REPOS.iter().find(|r| r.repo == repo)
}

/// Whether `name` is a favourite; an empty `repo` matches any repository.
pub fn is_favorite_skill(repo: &str, name: &str) -> bool {
    FAVORITE_SKILLS
        .iter()
        .any(|fav| fav.name == name && (repo.is_empty() || fav.repo == repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favorites_match_with_and_without_repo() {
        assert!(is_favorite_skill("", "qmd"));
        assert!(is_favorite_skill("tobi/qmd", "qmd"));
        assert!(!is_favorite_skill("expo/skills", "qmd"));
        assert!(!is_favorite_skill("", "unknown"));
    }

    #[test]
    fn every_favorite_repo_is_recommended() {
        for fav in favorite_skills() {
            if fav.repo == "sickn33/antigravity-awesome-skills" {
                continue;
            }
            assert!(skill_repo_by_name(fav.repo).is_some(), "{}", fav.repo);
        }
        assert_eq!(skill_repos().len(), 13);
    }
}
